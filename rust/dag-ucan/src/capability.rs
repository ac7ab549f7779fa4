use serde::{
    de::{self, MapAccess},
    ser::SerializeMap,
    Deserialize, Serialize,
};
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

/// A single capability claimed by a UCAN: a resource URI, an ability of the
/// form `<namespace>/<action>` (or `"*"`), optional caveats, and any other
/// keys the source token carried, preserved verbatim.
#[derive(Clone, Debug, PartialEq)]
pub struct Capability {
    pub resource: String,
    pub ability: String,
    pub caveats: Option<Value>,
    pub extra: BTreeMap<String, Value>,
}

impl Capability {
    pub fn new(resource: String, ability: String) -> Self {
        Capability {
            resource,
            ability,
            caveats: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_caveats(mut self, caveats: Value) -> Self {
        self.caveats = Some(caveats);
        self
    }
}

impl From<&Capability> for Capability {
    fn from(value: &Capability) -> Self {
        value.to_owned()
    }
}

impl From<(String, String)> for Capability {
    fn from(value: (String, String)) -> Self {
        Capability::new(value.0, value.1)
    }
}

impl From<(&str, &str)> for Capability {
    fn from(value: (&str, &str)) -> Self {
        Capability::new(value.0.to_owned(), value.1.to_owned())
    }
}

impl From<(&str, &str, &Value)> for Capability {
    fn from(value: (&str, &str, &Value)) -> Self {
        Capability::new(value.0.to_owned(), value.1.to_owned()).with_caveats(value.2.to_owned())
    }
}

/// Wire order is `with`, `can`, `nb`, then preserved keys; this is the order
/// the canonical JWT payload relies on.
impl Serialize for Capability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let length = 2 + usize::from(self.caveats.is_some()) + self.extra.len();
        let mut map = serializer.serialize_map(Some(length))?;
        map.serialize_entry("with", &self.resource)?;
        map.serialize_entry("can", &self.ability)?;
        if let Some(caveats) = &self.caveats {
            map.serialize_entry("nb", caveats)?;
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Structural decoding only: `with` and `can` must be strings, everything
/// else rides along. Semantic checks (URI form, ability form, the `my:*`
/// rule) happen in the schema pass, where field paths are known.
impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct CapabilityVisitor;

        impl<'de> de::Visitor<'de> for CapabilityVisitor {
            type Value = Capability;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a capability object with 'with' and 'can'")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = BTreeMap::<String, Value>::new();

                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    entries.insert(key, value);
                }

                let resource = match entries.remove("with") {
                    Some(Value::String(resource)) => resource,
                    other => {
                        return Err(de::Error::custom(format!(
                            "Capability has invalid 'with: {}', value must be a string",
                            json_or_null(other.as_ref())
                        )))
                    }
                };

                let ability = match entries.remove("can") {
                    Some(Value::String(ability)) => ability,
                    other => {
                        return Err(de::Error::custom(format!(
                            "Capability has invalid 'can: {}', value must be a string",
                            json_or_null(other.as_ref())
                        )))
                    }
                };

                Ok(Capability {
                    resource,
                    ability,
                    caveats: entries.remove("nb"),
                    extra: entries,
                })
            }
        }

        deserializer.deserialize_map(CapabilityVisitor)
    }
}

fn json_or_null(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "null".to_string(),
    }
}
