//! Configuration strings of the form `label:value;value%label:value`.
//!
//! Every listed value maps to the label in front of it, so
//! `highlight:lamp;door%speak:robot` reads as `lamp -> highlight`,
//! `door -> highlight`, `robot -> speak`. Malformed parts are logged and
//! skipped, never fatal.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::allocation::ResourceAllocation;
use crate::clock::Clock;
use crate::descriptor;
use crate::error::{Error, Result};

/// Two-way conversion between a value and its text form.
pub trait TextParser {
    type Value;

    fn parse(&self, text: &str) -> Result<Self::Value>;

    fn format(&self, value: &Self::Value) -> String;
}

/// [`TextParser`] for anything with `FromStr` and `Display`.
pub struct FromStrParser<T>(PhantomData<fn() -> T>);

impl<T> FromStrParser<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FromStrParser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TextParser for FromStrParser<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    type Value = T;

    fn parse(&self, text: &str) -> Result<T> {
        text.trim()
            .parse()
            .map_err(|e| Error::InvalidDescriptor(format!("{text:?}: {e}")))
    }

    fn format(&self, value: &T) -> String {
        value.to_string()
    }
}

/// [`TextParser`] for allocation descriptors; slots start at the clock's now.
pub struct AllocationParser<C: Clock> {
    clock: C,
}

impl<C: Clock> AllocationParser<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> TextParser for AllocationParser<C> {
    type Value = ResourceAllocation;

    fn parse(&self, text: &str) -> Result<ResourceAllocation> {
        descriptor::parse_allocation(text, &self.clock)
    }

    fn format(&self, value: &ResourceAllocation) -> String {
        descriptor::format_allocation(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separators {
    pub part: char,
    pub label: char,
    pub value: char,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            part: '%',
            label: ':',
            value: ';',
        }
    }
}

/// Splits configuration strings and converts the entries with a key parser
/// (for the listed values) and a value parser (for the labels).
pub struct PayloadParser<K, V> {
    keys: K,
    values: V,
    separators: Separators,
    ignored: Vec<String>,
}

impl<K: TextParser, V: TextParser> PayloadParser<K, V> {
    pub fn new(keys: K, values: V) -> Self {
        Self {
            keys,
            values,
            separators: Separators::default(),
            ignored: Vec::new(),
        }
    }

    pub fn with_separators(mut self, separators: Separators) -> Self {
        self.separators = separators;
        self
    }

    /// Labels to drop while splitting. A trailing `*` matches any suffix.
    pub fn with_ignored(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignored = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_ignored(&self, label: &str) -> bool {
        self.ignored.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => label.starts_with(prefix),
            None => label == pattern,
        })
    }

    /// Split `text` into a value -> label map. Blank parts are skipped quietly,
    /// malformed ones with a warning. A value listed twice keeps its last label.
    pub fn parse_payload(&self, text: &str) -> HashMap<String, String> {
        let sep = self.separators;
        let mut entries = HashMap::new();

        for part in text.split(sep.part).map(str::trim) {
            if part.is_empty() {
                continue;
            }
            let Some((label, values)) = part.split_once(sep.label) else {
                warn!("invalid configuration part {part:?}, ignoring");
                continue;
            };
            let label = label.trim();
            if label.is_empty() || values.contains(sep.label) {
                warn!("invalid configuration part {part:?}, ignoring");
                continue;
            }
            if self.is_ignored(label) {
                debug!("label {label:?} is ignored");
                continue;
            }
            for value in values.split(sep.value).map(str::trim) {
                if value.is_empty() {
                    warn!("empty value in configuration part {part:?}, ignoring");
                    continue;
                }
                entries.insert(value.to_string(), label.to_string());
            }
        }
        entries
    }

    /// Convert a split map into typed entries. The first entry that does not
    /// parse fails the whole configuration.
    pub fn parse_configuration(
        &self,
        entries: &HashMap<String, String>,
    ) -> Result<HashMap<K::Value, V::Value>>
    where
        K::Value: Eq + Hash,
    {
        entries
            .iter()
            .map(|(key, value)| Ok((self.keys.parse(key)?, self.values.parse(value)?)))
            .collect()
    }

    /// [`PayloadParser::parse_payload`] followed by [`PayloadParser::parse_configuration`].
    pub fn parse(&self, text: &str) -> Result<HashMap<K::Value, V::Value>>
    where
        K::Value: Eq + Hash,
    {
        self.parse_configuration(&self.parse_payload(text))
    }

    /// Render typed entries back into configuration text, one part per label.
    /// Parts and values are sorted so the output is stable.
    pub fn format(&self, config: &HashMap<K::Value, V::Value>) -> String {
        let sep = self.separators;
        let mut by_label: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in config {
            by_label
                .entry(self.values.format(value))
                .or_default()
                .push(self.keys.format(key));
        }
        let mut parts: Vec<String> = by_label
            .into_iter()
            .map(|(label, mut values)| {
                values.sort();
                format!("{label}{}{}", sep.label, values.join(&sep.value.to_string()))
            })
            .collect();
        parts.sort();
        parts.join(&sep.part.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::Priority;
    use crate::clock::FixedClock;
    use crate::model::Span;

    fn strings() -> PayloadParser<FromStrParser<String>, FromStrParser<String>> {
        PayloadParser::new(FromStrParser::new(), FromStrParser::new())
    }

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn values_map_to_their_label() {
        let entries = strings().parse_payload("highlight:lamp;door%speak:robot");
        assert_eq!(
            entries,
            map(&[("lamp", "highlight"), ("door", "highlight"), ("robot", "speak")])
        );
    }

    #[test]
    fn malformed_parts_are_skipped() {
        let entries = strings().parse_payload(
            "noseparator%:orphan%a:b:c%ok:x;;y%%trailing:%  spaced : z ;w %",
        );
        assert_eq!(
            entries,
            map(&[("x", "ok"), ("y", "ok"), ("z", "spaced"), ("w", "spaced")])
        );
    }

    #[test]
    fn empty_text_gives_empty_map() {
        assert!(strings().parse_payload("").is_empty());
        assert!(strings().parse_payload("%%").is_empty());
    }

    #[test]
    fn later_label_wins_for_repeated_value() {
        let entries = strings().parse_payload("a:x%b:x");
        assert_eq!(entries, map(&[("x", "b")]));
    }

    #[test]
    fn custom_separators() {
        let parser = strings().with_separators(Separators {
            part: '|',
            label: '=',
            value: ',',
        });
        let entries = parser.parse_payload("look=table,shelf|grab=cup");
        assert_eq!(
            entries,
            map(&[("table", "look"), ("shelf", "look"), ("cup", "grab")])
        );
        // Default separators are plain text under the custom set.
        assert!(parser.parse_payload("look:table").is_empty());
    }

    #[test]
    fn ignored_labels_and_prefixes() {
        let parser = strings().with_ignored(["debug", "tmp_*"]);
        assert!(parser.is_ignored("debug"));
        assert!(parser.is_ignored("tmp_lamp"));
        assert!(!parser.is_ignored("debugger"));
        let entries = parser.parse_payload("debug:a%tmp_1:b%keep:c");
        assert_eq!(entries, map(&[("c", "keep")]));
    }

    fn priorities() -> PayloadParser<FromStrParser<u32>, FromStrParser<Priority>> {
        PayloadParser::new(FromStrParser::new(), FromStrParser::new())
    }

    #[test]
    fn typed_configuration() {
        let parser = priorities();
        let config = parser.parse("HIGH:1;2%LOW:3").unwrap();
        assert_eq!(config.len(), 3);
        assert_eq!(config[&1], Priority::High);
        assert_eq!(config[&3], Priority::Low);
        assert_eq!(parser.format(&config), "HIGH:1;2%LOW:3");
    }

    #[test]
    fn typed_configuration_fails_on_bad_entry() {
        let parser = priorities();
        assert!(matches!(
            parser.parse("HIGH:1;two"),
            Err(Error::InvalidDescriptor(_))
        ));
        match parser.parse("SOMETIMES:1") {
            Err(Error::InvalidDescriptor(msg)) => assert!(msg.contains("SOMETIMES"), "{msg}"),
            other => panic!("expected descriptor error, got {other:?}"),
        }
    }

    #[test]
    fn allocation_values() {
        let clock = FixedClock::new(1_000);
        let parser = PayloadParser::new(FromStrParser::<String>::new(), AllocationParser::new(clock));
        let parser = parser.with_separators(Separators {
            part: '|',
            label: '=',
            value: '&',
        });
        let config = parser.parse("500,NORMAL,FIRST,arm=pick&place").unwrap();
        let pick = &config["pick"];
        assert_eq!(pick.slot, Span::new(1_000, 1_500));
        assert_eq!(config["place"], *pick);

        let allocations = AllocationParser::new(clock);
        assert_eq!(allocations.format(pick), "500,NORMAL,FIRST,arm");
    }
}
