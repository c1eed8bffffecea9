//! Request parameter extraction.
//!
//! Matrix clients send parameters either as a JSON object body or as query
//! string arguments. Both are collected into a [`Params`] map, checked for
//! missing names so every absent one can be reported at once, and then
//! deserialized into the handler's typed request.

use salvo::{Request, http::Method};
use serde::{
    Deserialize, Deserializer,
    de::{DeserializeOwned, Error as _},
};
use serde_json::{Map, Value};

use tessera_app::domain::sessions::records::SessionId;

use crate::errors::MatrixError;

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Params(Map<String, Value>);

impl Params {
    /// Parse the request body as a JSON object.
    pub(crate) async fn from_json_body(req: &mut Request) -> Result<Self, MatrixError> {
        let payload = req
            .payload()
            .await
            .map_err(|_error| MatrixError::not_json())?;

        match serde_json::from_slice::<Value>(payload) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) | Err(_) => Err(MatrixError::not_json()),
        }
    }

    /// Collect query string arguments, keeping the first value of each.
    pub(crate) fn from_query(req: &Request) -> Self {
        let mut map = Map::new();

        for (name, value) in req.queries().iter() {
            map.entry(name.clone())
                .or_insert_with(|| Value::String(value.clone()));
        }

        Self(map)
    }

    /// Query string for `GET`, JSON body for everything else.
    pub(crate) async fn from_request(req: &mut Request) -> Result<Self, MatrixError> {
        if *req.method() == Method::GET {
            return Ok(Self::from_query(req));
        }

        Self::from_json_body(req).await
    }

    /// Fail with every missing name listed when any of `names` is absent.
    pub(crate) fn require(&self, names: &[&str]) -> Result<(), MatrixError> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| matches!(self.0.get(*name), None | Some(Value::Null)))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MatrixError::missing_params(&missing))
        }
    }

    /// Check `required` names are present, then deserialize into `T`.
    pub(crate) fn parse<T: DeserializeOwned>(self, required: &[&str]) -> Result<T, MatrixError> {
        self.require(required)?;

        serde_json::from_value(Value::Object(self.0))
            .map_err(|error| MatrixError::invalid_param(error.to_string()))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntegerOrString {
    Integer(i64),
    String(String),
}

/// Session id given as a string or an integer.
pub(crate) fn session_id<'de, D>(deserializer: D) -> Result<SessionId, D::Error>
where
    D: Deserializer<'de>,
{
    match IntegerOrString::deserialize(deserializer) {
        Ok(IntegerOrString::Integer(sid)) => Ok(sid),
        Ok(IntegerOrString::String(sid)) => sid
            .trim()
            .parse()
            .map_err(|_error| D::Error::custom("sid must be an integer")),
        Err(_error) => Err(D::Error::custom("sid must be an integer")),
    }
}

/// Non-negative send attempt given as an integer or a numeric string.
pub(crate) fn send_attempt<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let invalid = || D::Error::custom("send_attempt should be an integer");

    match IntegerOrString::deserialize(deserializer) {
        Ok(IntegerOrString::Integer(attempt)) => u32::try_from(attempt).map_err(|_error| invalid()),
        Ok(IntegerOrString::String(attempt)) => attempt.trim().parse().map_err(|_error| invalid()),
        Err(_error) => Err(invalid()),
    }
}
