use serde::{Deserialize, Serialize};

use super::ids::{DogId, TrainerId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    pub id: DogId,
    pub name: String,
    /// Unset when no trainer has been assigned yet.
    #[serde(default)]
    pub trainer_id: Option<TrainerId>,
    #[serde(default)]
    pub chip_id: Option<String>,
    #[serde(default)]
    pub breed: Option<String>,
}

/// Exact name match, first dog in service order wins.
pub fn find_by_name<'a>(dogs: &'a [Dog], name: &str) -> Option<&'a Dog> {
    dogs.iter().find(|dog| dog.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dog(id: i64, name: &str) -> Dog {
        Dog {
            id: DogId(id),
            name: name.into(),
            trainer_id: Some(TrainerId(1)),
            chip_id: None,
            breed: None,
        }
    }

    #[test]
    fn test_find_by_name_is_exact() {
        let dogs = vec![dog(1, "Rex"), dog(2, "rex"), dog(3, "Rexy")];
        assert_eq!(find_by_name(&dogs, "rex").unwrap().id, DogId(2));
        assert_eq!(find_by_name(&dogs, "Rex").unwrap().id, DogId(1));
        assert!(find_by_name(&dogs, "REX").is_none());
        assert!(find_by_name(&dogs, "Re").is_none());
    }

    #[test]
    fn test_dog_without_trainer_deserializes() {
        let dog: Dog = serde_json::from_str(r#"{"id":5,"name":"Bim"}"#).unwrap();
        assert_eq!(dog.trainer_id, None);
    }
}
