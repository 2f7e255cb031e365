//! In-process [`DocumentCollection`].
//!
//! Holds documents behind a `tokio` lock, enforces declared unique fields,
//! and understands a subset of the MongoDB query language: field equality,
//! `$eq`, `$ne`, `$in`, `$nin`, `$exists`, `$regex` (with `$options`), and
//! top-level `$and` / `$or`. Updates accept `$set` and `$unset`.

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use regex::Regex;
use tokio::sync::RwLock;

use super::store::{DocumentCollection, StoreError, StoreResult};

/// In-memory collection used by tests and local runs.
#[derive(Debug, Default)]
pub struct MemoryCollection {
    documents: RwLock<Vec<Document>>,
    unique_fields: Vec<String>,
}

impl MemoryCollection {
    /// Create an empty collection without unique indexes
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty collection enforcing uniqueness on `fields`
    pub fn with_unique(fields: &[&str]) -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            unique_fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    fn check_unique(&self, documents: &[Document], candidate: &Document) -> StoreResult<()> {
        let candidate_id = candidate.get_object_id("_id").ok();

        for field in &self.unique_fields {
            let Some(value) = candidate.get(field) else {
                continue;
            };
            let taken = documents
                .iter()
                .filter(|doc| doc.get_object_id("_id").ok() != candidate_id)
                .any(|doc| doc.get(field) == Some(value));

            if taken {
                return Err(StoreError::DuplicateKey {
                    field: field.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn position_of(documents: &[Document], id: &ObjectId) -> Option<usize> {
    documents
        .iter()
        .position(|doc| doc.get_object_id("_id").ok().as_ref() == Some(id))
}

fn apply_update(target: &mut Document, update: &Document) -> StoreResult<()> {
    for (operator, fields) in update {
        let Bson::Document(fields) = fields else {
            return Err(StoreError::Malformed(format!("{} expects a document", operator)));
        };
        match operator.as_str() {
            "$set" => {
                for (key, value) in fields {
                    if key == "_id" {
                        return Err(StoreError::Malformed("_id is immutable".to_string()));
                    }
                    target.insert(key.clone(), value.clone());
                }
            }
            "$unset" => {
                for key in fields.keys() {
                    target.remove(key);
                }
            }
            other if other.starts_with('$') => {
                return Err(StoreError::UnsupportedOperator(other.to_string()));
            }
            other => {
                return Err(StoreError::Malformed(format!(
                    "update field {} is not an operator",
                    other
                )));
            }
        }
    }
    Ok(())
}

/// Whether `document` satisfies `filter`.
pub(crate) fn matches(document: &Document, filter: &Document) -> StoreResult<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for sub in sub_filters(key, condition)? {
                    all &= matches(document, sub)?;
                }
                all
            }
            "$or" => {
                let mut any = false;
                for sub in sub_filters(key, condition)? {
                    any |= matches(document, sub)?;
                }
                any
            }
            other if other.starts_with('$') => {
                return Err(StoreError::UnsupportedOperator(other.to_string()));
            }
            field => matches_condition(document.get(field), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn sub_filters<'a>(operator: &str, condition: &'a Bson) -> StoreResult<Vec<&'a Document>> {
    let Bson::Array(items) = condition else {
        return Err(StoreError::Malformed(format!("{} expects an array", operator)));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(doc) => Ok(doc),
            _ => Err(StoreError::Malformed(format!("{} expects documents", operator))),
        })
        .collect()
}

/// Missing fields compare equal to `null`.
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        Some(v) => v == expected,
        None => *expected == Bson::Null,
    }
}

fn is_operator_document(condition: &Bson) -> bool {
    match condition {
        Bson::Document(doc) => doc.keys().next().is_some_and(|k| k.starts_with('$')),
        _ => false,
    }
}

fn matches_condition(value: Option<&Bson>, condition: &Bson) -> StoreResult<bool> {
    if let Bson::RegularExpression(re) = condition {
        return regex_match(value, &re.pattern, &re.options);
    }
    if !is_operator_document(condition) {
        return Ok(equals(value, condition));
    }
    let Bson::Document(operators) = condition else {
        return Ok(false);
    };

    for (operator, argument) in operators {
        let ok = match operator.as_str() {
            "$eq" => equals(value, argument),
            "$ne" => !equals(value, argument),
            "$in" => in_list(value, operator, argument)?,
            "$nin" => !in_list(value, operator, argument)?,
            "$exists" => {
                let wanted = !matches!(
                    argument,
                    Bson::Boolean(false) | Bson::Int32(0) | Bson::Int64(0) | Bson::Null
                );
                value.is_some() == wanted
            }
            "$regex" => {
                let options = operators.get_str("$options").unwrap_or("");
                match argument {
                    Bson::String(pattern) => regex_match(value, pattern, options)?,
                    Bson::RegularExpression(re) => regex_match(value, &re.pattern, &re.options)?,
                    _ => return Err(StoreError::Malformed("$regex expects a string".to_string())),
                }
            }
            "$options" => true,
            other => return Err(StoreError::UnsupportedOperator(other.to_string())),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn in_list(value: Option<&Bson>, operator: &str, argument: &Bson) -> StoreResult<bool> {
    let Bson::Array(candidates) = argument else {
        return Err(StoreError::Malformed(format!("{} expects an array", operator)));
    };
    Ok(candidates.iter().any(|candidate| equals(value, candidate)))
}

fn regex_match(value: Option<&Bson>, pattern: &str, options: &str) -> StoreResult<bool> {
    let Some(Bson::String(text)) = value else {
        return Ok(false);
    };
    let pattern = if options.contains('i') {
        format!("(?i){}", pattern)
    } else {
        pattern.to_string()
    };
    let re = Regex::new(&pattern).map_err(|e| StoreError::Malformed(e.to_string()))?;
    Ok(re.is_match(text))
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    async fn insert_one(&self, mut document: Document) -> StoreResult<ObjectId> {
        let mut documents = self.documents.write().await;

        let id = match document.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            Some(other) => return Err(StoreError::Malformed(format!("non ObjectId _id: {}", other))),
            None => {
                let id = ObjectId::new();
                document.insert("_id", id);
                id
            }
        };

        if position_of(&documents, &id).is_some() {
            return Err(StoreError::DuplicateKey {
                field: "_id".to_string(),
                value: id.to_hex(),
            });
        }
        self.check_unique(&documents, &document)?;

        documents.push(document);
        Ok(id)
    }

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(position_of(&documents, &id).map(|i| documents[i].clone()))
    }

    async fn update_by_id(&self, id: ObjectId, update: Document) -> StoreResult<Option<Document>> {
        let mut documents = self.documents.write().await;
        let Some(index) = position_of(&documents, &id) else {
            return Ok(None);
        };

        let mut updated = documents[index].clone();
        apply_update(&mut updated, &update)?;
        self.check_unique(&documents, &updated)?;

        documents[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_by_id(&self, id: ObjectId) -> StoreResult<Option<Document>> {
        let mut documents = self.documents.write().await;
        Ok(position_of(&documents, &id).map(|i| documents.remove(i)))
    }

    async fn find(&self, filter: Document, skip: u64, limit: Option<u64>) -> StoreResult<Vec<Document>> {
        let documents = self.documents.read().await;

        let mut matching = Vec::new();
        for document in documents.iter() {
            if matches(document, &filter)? {
                matching.push(document.clone());
            }
        }
        matching.sort_by_key(|doc| doc.get_object_id("_id").ok());

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, filter: Document) -> StoreResult<u64> {
        let documents = self.documents.read().await;

        let mut count = 0;
        for document in documents.iter() {
            if matches(document, &filter)? {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let collection = MemoryCollection::new();
        let id = collection.insert_one(doc! { "name": "a" }).await.unwrap();

        let found = collection.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.get_object_id("_id").unwrap(), id);
        assert_eq!(collection.len().await, 1);
    }

    #[tokio::test]
    async fn test_unique_field_rejects_duplicate() {
        let collection = MemoryCollection::with_unique(&["email"]);
        collection.insert_one(doc! { "email": "a@b.co" }).await.unwrap();

        let result = collection.insert_one(doc! { "email": "a@b.co" }).await;
        assert!(matches!(result, Err(StoreError::DuplicateKey { ref field, .. }) if field == "email"));
        assert_eq!(collection.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_checks_unique_against_others_only() {
        let collection = MemoryCollection::with_unique(&["email"]);
        let first = collection.insert_one(doc! { "email": "a@b.co" }).await.unwrap();
        collection.insert_one(doc! { "email": "c@d.co" }).await.unwrap();

        let same = collection
            .update_by_id(first, doc! { "$set": { "email": "a@b.co", "kyc": true } })
            .await
            .unwrap()
            .unwrap();
        assert!(same.get_bool("kyc").unwrap());

        let clash = collection
            .update_by_id(first, doc! { "$set": { "email": "c@d.co" } })
            .await;
        assert!(matches!(clash, Err(StoreError::DuplicateKey { .. })));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_return_none() {
        let collection = MemoryCollection::new();
        let missing = ObjectId::new();

        assert!(collection
            .update_by_id(missing, doc! { "$set": { "a": 1 } })
            .await
            .unwrap()
            .is_none());
        assert!(collection.delete_by_id(missing).await.unwrap().is_none());
    }

    #[test]
    fn test_filter_operators() {
        let document = doc! { "username": "john_doe", "role": "admin", "kyc": false };

        assert!(matches(&document, &doc! {}).unwrap());
        assert!(matches(&document, &doc! { "role": "admin" }).unwrap());
        assert!(!matches(&document, &doc! { "role": "user" }).unwrap());
        assert!(matches(&document, &doc! { "role": { "$in": ["user", "admin"] } }).unwrap());
        assert!(matches(&document, &doc! { "role": { "$ne": "user" } }).unwrap());
        assert!(matches(&document, &doc! { "phone": { "$exists": false } }).unwrap());
        assert!(matches(&document, &doc! { "phone": null }).unwrap());
        assert!(matches(&document, &doc! { "username": { "$regex": "^JOHN", "$options": "i" } }).unwrap());
        assert!(matches(
            &document,
            &doc! { "$or": [ { "role": "user" }, { "kyc": false } ] }
        )
        .unwrap());
        assert!(!matches(
            &document,
            &doc! { "$and": [ { "role": "admin" }, { "kyc": true } ] }
        )
        .unwrap());
    }

    #[test]
    fn test_unsupported_operator() {
        let document = doc! { "age": 3 };
        let result = matches(&document, &doc! { "age": { "$gt": 1 } });
        assert!(matches!(result, Err(StoreError::UnsupportedOperator(op)) if op == "$gt"));
    }

    #[tokio::test]
    async fn test_find_orders_and_slices() {
        let collection = MemoryCollection::new();
        for i in 0..5 {
            collection.insert_one(doc! { "n": i }).await.unwrap();
        }

        let slice = collection.find(doc! {}, 1, Some(2)).await.unwrap();
        let values: Vec<i32> = slice.iter().map(|d| d.get_i32("n").unwrap()).collect();
        assert_eq!(values, vec![1, 2]);
        assert_eq!(collection.count(doc! { "n": { "$in": [0, 4] } }).await.unwrap(), 2);
    }
}
