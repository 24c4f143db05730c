use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace stripped from identifiers during normalization.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Canonical block state: a namespaced identifier plus ordered properties.
///
/// Two keys with the same identifier and the same property map are
/// interchangeable; the BTreeMap keeps property insertion order out of
/// equality and hashing.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct BlockStateKey {
    ident: String,
    props: BTreeMap<String, String>,
}

impl BlockStateKey {
    pub fn new(ident: &str) -> Self {
        BlockStateKey {
            ident: normalize_ident(ident),
            props: BTreeMap::new(),
        }
    }

    pub fn with_props<I, K, V>(ident: &str, props: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        BlockStateKey {
            ident: normalize_ident(ident),
            props: props
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse the wire form `namespace:ident[key=value,key=value]`.
    /// Malformed property fragments are skipped rather than rejected.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (ident, rest) = match text.find('[') {
            Some(open) => (&text[..open], Some(&text[open + 1..])),
            None => (text, None),
        };

        let mut key = BlockStateKey::new(ident);
        if let Some(rest) = rest {
            let body = rest.trim_end_matches(']');
            for pair in body.split(',') {
                let pair = pair.trim();
                if pair.is_empty() {
                    continue;
                }
                if let Some(eq) = pair.find('=') {
                    let (k, v) = (pair[..eq].trim(), pair[eq + 1..].trim());
                    if !k.is_empty() {
                        key.props.insert(k.to_string(), v.to_string());
                    }
                }
            }
        }
        key
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn prop(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }

    pub fn props(&self) -> &BTreeMap<String, String> {
        &self.props
    }

    pub fn set_prop(&mut self, key: &str, value: &str) {
        self.props.insert(key.to_string(), value.to_string());
    }

    pub fn has_props(&self) -> bool {
        !self.props.is_empty()
    }
}

impl fmt::Display for BlockStateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ident.contains(':') {
            write!(f, "{}", self.ident)?;
        } else {
            write!(f, "{}:{}", DEFAULT_NAMESPACE, self.ident)?;
        }
        if !self.props.is_empty() {
            write!(f, "[")?;
            for (i, (k, v)) in self.props.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}={}", k, v)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// Lowercase the identifier and strip the default namespace prefix.
/// Non-default namespaces (`myaddon:custom_block`) are kept intact.
pub fn normalize_ident(raw: &str) -> String {
    let lower = raw.trim().to_ascii_lowercase();
    match lower.strip_prefix("minecraft:") {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

/// Compact host-native block representation: numeric id plus variant code.
/// Many canonical states collapse onto one `HostBlock`; the reverse mapping
/// is approximate by construction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct HostBlock {
    pub id: u16,
    pub variant: u16,
}

impl HostBlock {
    pub const AIR: HostBlock = HostBlock { id: 0, variant: 0 };

    pub const fn new(id: u16, variant: u16) -> Self {
        HostBlock { id, variant }
    }
}
