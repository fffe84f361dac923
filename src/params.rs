/// Decoded `application/x-www-form-urlencoded` pairs from a query string or
/// form body, in their original order. Keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pairs: Vec<(String, String)>,
}

impl RequestParams {
    pub fn parse(raw: &str) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(raw.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Concatenate two parameter sets; on lookup the later set wins.
    pub fn merged(mut self, other: Self) -> Self {
        self.pairs.extend(other.pairs);
        self
    }

    /// Last value for `key`, trimmed; blank values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Every value for `key`, also accepting the `key[]` array spelling.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        let array_key = format!("{key}[]");
        self.pairs
            .iter()
            .filter(|(k, _)| k == key || *k == array_key)
            .map(|(_, v)| v.trim())
            .collect()
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Serialize `keep` keys (in that order) back into a query string.
    pub fn to_query(&self, keep: &[&str]) -> String {
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        for key in keep {
            if let Some(value) = self.get(key) {
                out.append_pair(key, value);
            }
        }
        out.finish()
    }
}
