use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of POST /api/auth, dispatched on the `action` tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum AuthRequest {
    Signup {
        email: String,
        password: String,
    },
    Login {
        email: String,
        password: String,
    },
    #[serde(rename_all = "camelCase")]
    Save {
        token: String,
        #[serde(default)]
        form_data: Value,
        #[serde(default)]
        generated_html: Option<String>,
        #[serde(default)]
        story_copy: Value,
        #[serde(default)]
        site_id: Option<String>,
        #[serde(default)]
        site_url: Option<String>,
    },
    Load {
        token: String,
    },
}

/// Row upserted into the sites table, keyed on `user_id` (one row per user).
/// `form_data` and `story_copy` are opaque front-end payloads, stored as-is.
/// Fields absent from a save are omitted from the write entirely: a PATCH
/// carrying an explicit null would erase what an earlier save stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRecord {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub form_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_html: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub story_copy: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    pub updated_at: String,
}

/// Body of POST /api/deploy-site.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub site_name: Option<String>,
    /// Hosting site to republish to; a new site is allocated when absent.
    #[serde(default)]
    pub site_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub success: bool,
    pub site_id: String,
    pub url: String,
    pub deploy_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request_deserialization() {
        let json = r#"{"action": "signup", "email": "a@b.c", "password": "hunter2"}"#;
        let request: AuthRequest = serde_json::from_str(json).unwrap();
        match request {
            AuthRequest::Signup { email, password } => {
                assert_eq!(email, "a@b.c");
                assert_eq!(password, "hunter2");
            }
            other => panic!("expected signup, got {:?}", other),
        }
    }

    #[test]
    fn test_save_request_uses_camel_case_fields() {
        let json = r#"{
            "action": "save",
            "token": "jwt",
            "formData": {"theme": "rustic"},
            "generatedHtml": "<html></html>",
            "storyCopy": {"intro": "..."},
            "siteId": "abc-123",
            "siteUrl": "https://jane-john.netlify.app"
        }"#;
        let request: AuthRequest = serde_json::from_str(json).unwrap();
        match request {
            AuthRequest::Save {
                token,
                form_data,
                generated_html,
                site_id,
                site_url,
                ..
            } => {
                assert_eq!(token, "jwt");
                assert_eq!(form_data["theme"], "rustic");
                assert_eq!(generated_html.as_deref(), Some("<html></html>"));
                assert_eq!(site_id.as_deref(), Some("abc-123"));
                assert_eq!(site_url.as_deref(), Some("https://jane-john.netlify.app"));
            }
            other => panic!("expected save, got {:?}", other),
        }
    }

    #[test]
    fn test_save_request_payload_fields_are_optional() {
        let json = r#"{"action": "save", "token": "jwt"}"#;
        let request: AuthRequest = serde_json::from_str(json).unwrap();
        match request {
            AuthRequest::Save {
                form_data,
                generated_html,
                site_id,
                ..
            } => {
                assert!(form_data.is_null());
                assert!(generated_html.is_none());
                assert!(site_id.is_none());
            }
            other => panic!("expected save, got {:?}", other),
        }
    }

    #[test]
    fn test_site_record_omits_absent_columns_from_writes() {
        let record = SiteRecord {
            user_id: "user-1".to_string(),
            form_data: serde_json::json!({ "theme": "rustic" }),
            generated_html: None,
            story_copy: Value::Null,
            site_id: None,
            site_url: None,
            updated_at: "2026-08-24T00:00:00+00:00".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();

        // Absent fields stay out of the body so a PATCH cannot null out a
        // previously saved site id or URL.
        assert!(!object.contains_key("generated_html"));
        assert!(!object.contains_key("site_id"));
        assert!(!object.contains_key("site_url"));
        assert!(!object.contains_key("story_copy"));
        assert!(object.contains_key("form_data"));
        assert!(object.contains_key("updated_at"));
    }

    #[test]
    fn test_site_record_keeps_present_columns() {
        let record = SiteRecord {
            user_id: "user-1".to_string(),
            form_data: Value::Null,
            generated_html: Some("<html></html>".to_string()),
            story_copy: Value::Null,
            site_id: Some("site-42".to_string()),
            site_url: Some("https://jane-john.netlify.app".to_string()),
            updated_at: "2026-08-24T00:00:00+00:00".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["site_id"], "site-42");
        assert_eq!(json["site_url"], "https://jane-john.netlify.app");
        assert_eq!(json["generated_html"], "<html></html>");
        assert!(json.get("form_data").is_none());
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let json = r#"{"action": "delete", "token": "jwt"}"#;
        assert!(serde_json::from_str::<AuthRequest>(json).is_err());
    }

    #[test]
    fn test_publish_request_defaults() {
        let json = r#"{"html": "<h1>hi</h1>"}"#;
        let request: PublishRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.html, "<h1>hi</h1>");
        assert!(request.site_name.is_none());
        assert!(request.site_id.is_none());
    }

    #[test]
    fn test_publish_response_serialization() {
        let response = PublishResponse {
            success: true,
            site_id: "site-1".to_string(),
            url: "https://jane-john.netlify.app".to_string(),
            deploy_id: "deploy-1".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["siteId"], "site-1");
        assert_eq!(json["deployId"], "deploy-1");
    }
}
