// SPDX-FileCopyrightText: 2026 smsrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request bodies and query strings, and their validation.
//!
//! Every field is deserialized leniently (as an optional string or raw JSON)
//! so that all problems can be reported together, one entry per field.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use smsrelay_core::{
    FieldError, MessageFilter, MessageId, MessageStatus, MessageType, NewMessage, ServiceMode,
    SmsRelayError, UserMetadata,
};

/// Optional `+`, then 8 to 15 digits (after removing spaces and dashes).
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{8,15}$").unwrap());

/// Longest accepted message body, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

const REQUIRED: &str = "is required";

/// Body of `POST {prefix}/send-message`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub phone: Option<String>,
    pub message: Option<String>,
    pub app: Option<String>,
    pub user: Option<serde_json::Value>,
    pub message_type: Option<String>,
    pub mode: Option<String>,
}

/// Body of `POST {prefix}/send-message/status`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub message_id: Option<String>,
    pub status: Option<String>,
}

/// Query string of `GET {prefix}/messages`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub message_type: Option<String>,
    pub status: Option<String>,
    pub phone: Option<String>,
    pub app: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Query string of `GET {prefix}/messages/chat/{chatId}`.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Validated list parameters; `None` page values fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub filter: MessageFilter,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SendMessageRequest {
    pub fn validate(self) -> Result<NewMessage, SmsRelayError> {
        let mut errors = Vec::new();

        let phone = required(&mut errors, "phone", self.phone);
        if let Some(phone) = &phone {
            if !is_valid_phone(phone) {
                errors.push(FieldError::new(
                    "phone",
                    "must be 8 to 15 digits with an optional leading +",
                ));
            }
        }

        let text = required(&mut errors, "message", self.message);
        if let Some(text) = &text {
            if text.chars().count() > MAX_MESSAGE_CHARS {
                errors.push(FieldError::new(
                    "message",
                    format!("must be at most {MAX_MESSAGE_CHARS} characters"),
                ));
            }
        }

        let app = required(&mut errors, "app", self.app);
        let user = parse_user(&mut errors, self.user);

        let message_type = match blank_to_none(self.message_type) {
            None => {
                errors.push(FieldError::new("messageType", REQUIRED));
                None
            }
            Some(raw) => parse_enum::<MessageType>(&mut errors, "messageType", &raw, "CODE, INFO"),
        };

        let mode = match blank_to_none(self.mode) {
            None => Some(ServiceMode::default()),
            Some(raw) => {
                parse_enum::<ServiceMode>(&mut errors, "mode", &raw, "prod, dev, test, stage")
            }
        };

        match (phone, text, app, user, message_type, mode) {
            (Some(phone), Some(text), Some(app), Some(user), Some(message_type), Some(mode))
                if errors.is_empty() =>
            {
                Ok(NewMessage {
                    phone,
                    app,
                    text,
                    user,
                    message_type,
                    mode,
                })
            }
            _ => Err(SmsRelayError::Validation { fields: errors }),
        }
    }
}

impl StatusUpdateRequest {
    pub fn validate(self) -> Result<(MessageId, MessageStatus), SmsRelayError> {
        let mut errors = Vec::new();
        let id = required(&mut errors, "messageId", self.message_id);
        let status = match blank_to_none(self.status) {
            None => {
                errors.push(FieldError::new("status", REQUIRED));
                None
            }
            Some(raw) => {
                parse_enum::<MessageStatus>(&mut errors, "status", &raw, "PENDING, SENT, FAILED")
            }
        };

        match (id, status) {
            (Some(id), Some(status)) if errors.is_empty() => Ok((MessageId(id), status)),
            _ => Err(SmsRelayError::Validation { fields: errors }),
        }
    }
}

impl ListQuery {
    pub fn validate(self) -> Result<ListParams, SmsRelayError> {
        let mut errors = Vec::new();

        let message_type = blank_to_none(self.message_type)
            .and_then(|raw| parse_enum(&mut errors, "messageType", &raw, "CODE, INFO"));
        let status = blank_to_none(self.status)
            .and_then(|raw| parse_enum(&mut errors, "status", &raw, "PENDING, SENT, FAILED"));
        let page = parse_positive(&mut errors, "page", self.page);
        let limit = parse_positive(&mut errors, "limit", self.limit);

        if !errors.is_empty() {
            return Err(SmsRelayError::Validation { fields: errors });
        }
        Ok(ListParams {
            filter: MessageFilter {
                message_type,
                status,
                phone: blank_to_none(self.phone),
                app: blank_to_none(self.app),
                chat_id: None,
            },
            page,
            limit,
        })
    }
}

impl PageQuery {
    pub fn validate(self) -> Result<(Option<u32>, Option<u32>), SmsRelayError> {
        let mut errors = Vec::new();
        let page = parse_positive(&mut errors, "page", self.page);
        let limit = parse_positive(&mut errors, "limit", self.limit);
        if errors.is_empty() {
            Ok((page, limit))
        } else {
            Err(SmsRelayError::Validation { fields: errors })
        }
    }
}

/// Whether `phone` is an acceptable destination number.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    PHONE_PATTERN.is_match(&compact)
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(errors: &mut Vec<FieldError>, field: &str, value: Option<String>) -> Option<String> {
    let value = blank_to_none(value);
    if value.is_none() {
        errors.push(FieldError::new(field, REQUIRED));
    }
    value
}

fn parse_enum<T: std::str::FromStr>(
    errors: &mut Vec<FieldError>,
    field: &str,
    raw: &str,
    allowed: &str,
) -> Option<T> {
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            errors.push(FieldError::new(field, format!("must be one of {allowed}")));
            None
        }
    }
}

fn parse_positive(errors: &mut Vec<FieldError>, field: &str, raw: Option<String>) -> Option<u32> {
    let raw = blank_to_none(raw)?;
    match raw.parse::<u32>() {
        Ok(n) if n >= 1 => Some(n),
        _ => {
            errors.push(FieldError::new(
                field,
                "must be an integer greater than or equal to 1",
            ));
            None
        }
    }
}

/// `user` must be a non-empty object whose values are all primitives.
fn parse_user(errors: &mut Vec<FieldError>, raw: Option<serde_json::Value>) -> Option<UserMetadata> {
    let Some(raw) = raw.filter(|v| !v.is_null()) else {
        errors.push(FieldError::new("user", REQUIRED));
        return None;
    };
    let Some(object) = raw.as_object() else {
        errors.push(FieldError::new("user", "must be an object"));
        return None;
    };
    if object.is_empty() {
        errors.push(FieldError::new("user", "must not be empty"));
        return None;
    }
    if let Some((key, _)) = object
        .iter()
        .find(|(_, v)| v.is_object() || v.is_array())
    {
        errors.push(FieldError::new(
            "user",
            format!("value of `{key}` must be a string, number, boolean or null"),
        ));
        return None;
    }

    match serde_json::from_value(raw) {
        Ok(user) => Some(user),
        Err(e) => {
            errors.push(FieldError::new("user", e.to_string()));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_request() -> SendMessageRequest {
        serde_json::from_value(json!({
            "phone": "+591 781-11111",
            "message": "Your code is 4821",
            "app": "UNIA",
            "user": {"ci": "1234567", "nombreCompleto": "Ana Perez", "msPersonaId": 9},
            "messageType": "CODE"
        }))
        .unwrap()
    }

    fn field_names(err: SmsRelayError) -> Vec<String> {
        match err {
            SmsRelayError::Validation { fields } => fields.into_iter().map(|f| f.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_request_converts() {
        let msg = valid_request().validate().unwrap();
        assert_eq!(msg.phone, "+591 781-11111");
        assert_eq!(msg.message_type, MessageType::Code);
        assert_eq!(msg.mode, ServiceMode::Prod);
        assert_eq!(msg.user.get_str("ci"), Some("1234567"));
    }

    #[test]
    fn legacy_type_labels_are_accepted() {
        let mut req = valid_request();
        req.message_type = Some("Informativo".to_string());
        req.mode = Some("stage".to_string());
        let msg = req.validate().unwrap();
        assert_eq!(msg.message_type, MessageType::Info);
        assert_eq!(msg.mode, ServiceMode::Stage);
    }

    #[test]
    fn empty_body_reports_every_required_field() {
        let err = SendMessageRequest::default().validate().unwrap_err();
        assert_eq!(
            field_names(err),
            ["phone", "message", "app", "user", "messageType"]
        );
    }

    #[test]
    fn phone_rules() {
        assert!(is_valid_phone("+59178111111"));
        assert!(is_valid_phone("591 781-11111"));
        assert!(is_valid_phone("12345678"));
        assert!(!is_valid_phone("1234567"));
        assert!(!is_valid_phone("1234567890123456"));
        assert!(!is_valid_phone("++59178111111"));
        assert!(!is_valid_phone("5917811111a"));
    }

    #[test]
    fn message_length_is_bounded() {
        let mut req = valid_request();
        req.message = Some("x".repeat(MAX_MESSAGE_CHARS));
        assert!(req.validate().is_ok());

        let mut req = valid_request();
        req.message = Some("x".repeat(MAX_MESSAGE_CHARS + 1));
        assert_eq!(field_names(req.validate().unwrap_err()), ["message"]);
    }

    #[test]
    fn user_must_be_flat_non_empty_object() {
        for (user, reason) in [
            (json!({}), "must not be empty"),
            (json!([1, 2]), "must be an object"),
            (json!({"nested": {"a": 1}}), "must be a string"),
        ] {
            let mut req = valid_request();
            req.user = Some(user);
            match req.validate().unwrap_err() {
                SmsRelayError::Validation { fields } => {
                    assert_eq!(fields[0].field, "user");
                    assert!(fields[0].message.contains(reason), "{}", fields[0].message);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_enum_values_are_rejected() {
        let mut req = valid_request();
        req.message_type = Some("PROMO".to_string());
        req.mode = Some("qa".to_string());
        assert_eq!(field_names(req.validate().unwrap_err()), ["messageType", "mode"]);
    }

    #[test]
    fn status_update_validation() {
        let ok = StatusUpdateRequest {
            message_id: Some("abc".to_string()),
            status: Some("Enviado".to_string()),
        };
        assert_eq!(
            ok.validate().unwrap(),
            (MessageId::from("abc"), MessageStatus::Sent)
        );

        let bad = StatusUpdateRequest {
            message_id: Some("  ".to_string()),
            status: Some("DONE".to_string()),
        };
        assert_eq!(field_names(bad.validate().unwrap_err()), ["messageId", "status"]);
    }

    #[test]
    fn list_query_parses_filters_and_pages() {
        let query = ListQuery {
            message_type: Some("INFO".to_string()),
            status: Some("".to_string()),
            phone: Some("78111111".to_string()),
            app: None,
            page: Some("2".to_string()),
            limit: None,
        };
        let params = query.validate().unwrap();
        assert_eq!(params.filter.message_type, Some(MessageType::Info));
        assert_eq!(params.filter.status, None);
        assert_eq!(params.filter.phone.as_deref(), Some("78111111"));
        assert_eq!(params.page, Some(2));
        assert_eq!(params.limit, None);
    }

    #[test]
    fn list_query_rejects_bad_pages() {
        let query = ListQuery {
            page: Some("0".to_string()),
            limit: Some("ten".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(field_names(query.validate().unwrap_err()), ["page", "limit"]);
    }
}
