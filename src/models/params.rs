use serde::de::{DeserializeOwned, Error as DeError};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The root key a resource's attributes may be nested under, e.g. `"task"`.
pub trait ParamKey {
    const KEY: &'static str;
}

/// Request body accepted either as `{"<key>": {...}}` or as the bare attribute object.
///
/// Serializes in the wrapped form.
#[derive(Debug, Clone)]
pub struct Params<T>(pub T);

impl<T> Params<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<'de, T> Deserialize<'de> for Params<T>
where
    T: DeserializeOwned + ParamKey,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = Value::deserialize(deserializer)?;
        let attrs = match value.as_object_mut().and_then(|map| map.remove(T::KEY)) {
            Some(inner @ Value::Object(_)) => inner,
            Some(_) => {
                return Err(D::Error::custom(format!(
                    "param is missing or the value is empty: {}",
                    T::KEY
                )))
            }
            None => value,
        };
        T::deserialize(attrs).map(Params).map_err(D::Error::custom)
    }
}

impl<T> Serialize for Params<T>
where
    T: Serialize + ParamKey,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(T::KEY, &self.0)?;
        map.end()
    }
}

/// Deserializes a field so that an explicit `null` is `Some(None)` and absence is `None`.
///
/// Pair with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
