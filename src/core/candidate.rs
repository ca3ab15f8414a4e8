use serde::{Deserialize, Serialize};

/// Deserialize an id from string or int (host databases use both)
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdValue {
        Int(i64),
        String(String),
    }

    match IdValue::deserialize(deserializer)? {
        IdValue::Int(i) => Ok(i.to_string()),
        IdValue::String(s) => Ok(s),
    }
}

/// A nomenclature or supplier-name record eligible to match a query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Unique record id
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// Display name (nomenclature or supplier product name)
    pub name: String,

    /// Supplier label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,

    /// Unit price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    /// Free-text characteristics (sizes, grades, standards)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characteristics: Option<String>,
}

impl Candidate {
    /// Create a new Candidate with required fields
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supplier: None,
            price: None,
            characteristics: None,
        }
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_characteristics(mut self, characteristics: impl Into<String>) -> Self {
        self.characteristics = Some(characteristics.into());
        self
    }

    /// Get display name (for logging/UI)
    pub fn display_name(&self) -> String {
        match &self.supplier {
            Some(supplier) => format!("{} ({})", self.name, supplier),
            None => self.name.clone(),
        }
    }
}

/// Optional disambiguation context sent with a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_id: Option<String>,
}

/// Free-text input for one matching pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<QueryContext>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: QueryContext) -> Self {
        self.context = Some(context);
        self
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Query::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_creation() {
        let candidate = Candidate::new("42", "Пеноплэкс 50мм").with_supplier("ТехноНИКОЛЬ");
        assert_eq!(candidate.id, "42");
        assert_eq!(candidate.display_name(), "Пеноплэкс 50мм (ТехноНИКОЛЬ)");
    }

    #[test]
    fn test_numeric_id_deserialization() {
        let candidate: Candidate =
            serde_json::from_str(r#"{"id": 17, "name": "Бетон М300", "price": 5400.0}"#).unwrap();
        assert_eq!(candidate.id, "17");
        assert_eq!(candidate.price, Some(5400.0));
        assert!(candidate.supplier.is_none());
    }

    #[test]
    fn test_query_context_camel_case() {
        let query: Query = serde_json::from_str(
            r#"{"text": "бетон", "context": {"projectId": "p1", "categoryId": "c9"}}"#,
        )
        .unwrap();
        let context = query.context.unwrap();
        assert_eq!(context.project_id.as_deref(), Some("p1"));
        assert_eq!(context.category_id.as_deref(), Some("c9"));
        assert!(context.type_id.is_none());
    }

    #[test]
    fn test_builders_serialize_camel_case() {
        let candidate = Candidate::new("7", "Бетон М300")
            .with_price(5400.0)
            .with_characteristics("В22.5 П4");
        let json = serde_json::to_value(&candidate).unwrap();
        assert_eq!(json["price"], 5400.0);
        assert!(json.get("supplier").is_none());

        let query = Query::from("бетон").with_context(QueryContext {
            type_id: Some("t3".to_string()),
            ..Default::default()
        });
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["context"]["typeId"], "t3");
    }
}
