//! OpenAPI documentation
//!
//! Hand-maintained OpenAPI 3.0 document for the MailPulse HTTP surface.

use axum::{response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

/// Create OpenAPI routes
pub fn create_openapi_routes() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// OpenAPI JSON specification endpoint
async fn openapi_json() -> impl IntoResponse {
    Json(get_openapi_spec())
}

fn uuid_param(name: &str) -> serde_json::Value {
    json!({"name": name, "in": "path", "required": true, "schema": {"type": "string", "format": "uuid"}})
}

fn json_body(schema: serde_json::Value) -> serde_json::Value {
    json!({"application/json": {"schema": schema}})
}

fn schema_ref(name: &str) -> serde_json::Value {
    json!({"$ref": format!("#/components/schemas/{}", name)})
}

fn array_of(name: &str) -> serde_json::Value {
    json!({"type": "array", "items": schema_ref(name)})
}

/// Get the OpenAPI specification as JSON
pub fn get_openapi_spec() -> serde_json::Value {
    let error = json_body(schema_ref("ErrorResponse"));

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "MailPulse API",
            "description": "Email campaign open/click tracking and analytics",
            "version": env!("CARGO_PKG_VERSION"),
            "license": {
                "name": "Apache-2.0",
                "url": "https://www.apache.org/licenses/LICENSE-2.0"
            }
        },
        "tags": [
            {"name": "health", "description": "Health check endpoints"},
            {"name": "tracking", "description": "Endpoints embedded in outbound email"},
            {"name": "analytics", "description": "Statistics and activity"},
            {"name": "campaigns", "description": "Campaign records"},
            {"name": "send", "description": "Email sending"}
        ],
        "paths": {
            "/health": {
                "get": {
                    "tags": ["health"],
                    "summary": "Liveness check",
                    "operationId": "health",
                    "responses": {
                        "200": {"description": "Service is running", "content": json_body(schema_ref("HealthResponse"))}
                    }
                }
            },
            "/health/ready": {
                "get": {
                    "tags": ["health"],
                    "summary": "Readiness probe",
                    "operationId": "readiness",
                    "responses": {
                        "200": {"description": "Datastore reachable"},
                        "503": {"description": "Datastore unreachable"}
                    }
                }
            },
            "/metrics": {
                "get": {
                    "tags": ["health"],
                    "summary": "Prometheus tracking counters",
                    "operationId": "metrics",
                    "responses": {
                        "200": {"description": "Text exposition format", "content": {"text/plain": {"schema": {"type": "string"}}}}
                    }
                }
            },
            "/track/open/{id}": {
                "get": {
                    "tags": ["tracking"],
                    "summary": "Open pixel",
                    "description": "Records an open for the recipient and returns a 1x1 transparent GIF. Unknown ids and datastore failures still return the pixel.",
                    "operationId": "trackOpen",
                    "parameters": [
                        {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}
                    ],
                    "responses": {
                        "200": {"description": "Transparent pixel", "content": {"image/gif": {"schema": {"type": "string", "format": "binary"}}}}
                    }
                }
            },
            "/track/click/{id}": {
                "get": {
                    "tags": ["tracking"],
                    "summary": "Click redirect",
                    "description": "Records a click for the recipient and redirects to the original destination.",
                    "operationId": "trackClick",
                    "parameters": [
                        {"name": "id", "in": "path", "required": true, "schema": {"type": "string"}},
                        {"name": "url", "in": "query", "required": true, "schema": {"type": "string"}}
                    ],
                    "responses": {
                        "302": {"description": "Redirect to url"},
                        "400": {"description": "Missing URL parameter"}
                    }
                }
            },
            "/api/stats": {
                "get": {
                    "tags": ["analytics"],
                    "summary": "Overall statistics",
                    "operationId": "overallStats",
                    "responses": {
                        "200": {"description": "Statistics across all campaigns", "content": json_body(schema_ref("CampaignStats"))},
                        "500": {"description": "Datastore failure", "content": error}
                    }
                }
            },
            "/api/analytics": {
                "get": {
                    "tags": ["analytics"],
                    "summary": "Dashboard snapshot",
                    "operationId": "analytics",
                    "parameters": [
                        {"name": "limit", "in": "query", "required": false, "schema": {"type": "integer", "default": 50}}
                    ],
                    "responses": {
                        "200": {"description": "Overall stats, campaign performance and recent events", "content": json_body(schema_ref("AnalyticsReport"))}
                    }
                }
            },
            "/api/campaigns": {
                "get": {
                    "tags": ["campaigns"],
                    "summary": "List campaigns with statistics",
                    "operationId": "listCampaigns",
                    "responses": {
                        "200": {"description": "Campaigns, newest first", "content": json_body(array_of("CampaignPerformance"))}
                    }
                },
                "post": {
                    "tags": ["campaigns"],
                    "summary": "Create a draft campaign",
                    "operationId": "createCampaign",
                    "requestBody": {"required": true, "content": json_body(schema_ref("CreateCampaignRequest"))},
                    "responses": {
                        "201": {"description": "Campaign created", "content": json_body(schema_ref("Campaign"))},
                        "400": {"description": "Missing required fields", "content": error}
                    }
                }
            },
            "/api/campaigns/{campaign_id}": {
                "get": {
                    "tags": ["campaigns"],
                    "summary": "Get a campaign",
                    "operationId": "getCampaign",
                    "parameters": [uuid_param("campaign_id")],
                    "responses": {
                        "200": {"description": "Campaign", "content": json_body(schema_ref("Campaign"))},
                        "404": {"description": "Campaign not found", "content": error}
                    }
                }
            },
            "/api/campaigns/{campaign_id}/stats": {
                "get": {
                    "tags": ["campaigns"],
                    "summary": "Campaign statistics",
                    "operationId": "getCampaignStats",
                    "parameters": [uuid_param("campaign_id")],
                    "responses": {
                        "200": {"description": "Statistics", "content": json_body(schema_ref("CampaignStats"))},
                        "404": {"description": "Campaign not found", "content": error}
                    }
                }
            },
            "/api/campaigns/{campaign_id}/recipients": {
                "get": {
                    "tags": ["campaigns"],
                    "summary": "Campaign recipients",
                    "operationId": "listRecipients",
                    "parameters": [uuid_param("campaign_id")],
                    "responses": {
                        "200": {"description": "Recipients, newest first", "content": json_body(array_of("Recipient"))},
                        "404": {"description": "Campaign not found", "content": error}
                    }
                }
            },
            "/api/campaigns/{campaign_id}/timeline": {
                "get": {
                    "tags": ["campaigns"],
                    "summary": "Daily opens and clicks",
                    "operationId": "getTimeline",
                    "parameters": [uuid_param("campaign_id")],
                    "responses": {
                        "200": {"description": "One entry per UTC day with activity", "content": json_body(array_of("DailyActivity"))},
                        "404": {"description": "Campaign not found", "content": error}
                    }
                }
            },
            "/api/campaigns/{campaign_id}/drift": {
                "get": {
                    "tags": ["campaigns"],
                    "summary": "Counter drift report",
                    "description": "Recipients whose open/click counters differ from the number of logged events. Read-only.",
                    "operationId": "getDrift",
                    "parameters": [uuid_param("campaign_id")],
                    "responses": {
                        "200": {"description": "Drifted recipients", "content": json_body(array_of("CounterDrift"))},
                        "404": {"description": "Campaign not found", "content": error}
                    }
                }
            },
            "/api/send": {
                "post": {
                    "tags": ["send"],
                    "summary": "Send a campaign to one address",
                    "operationId": "sendEmail",
                    "requestBody": {"required": true, "content": json_body(schema_ref("SendEmailRequest"))},
                    "responses": {
                        "200": {"description": "Email sent", "content": json_body(schema_ref("SendEmailResponse"))},
                        "400": {"description": "Missing or invalid fields", "content": error},
                        "404": {"description": "Campaign not found", "content": error},
                        "502": {"description": "Mail relay refused the message", "content": error}
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "ErrorResponse": {
                    "type": "object",
                    "properties": {
                        "error": {"type": "string"},
                        "message": {"type": "string"}
                    }
                },
                "HealthResponse": {
                    "type": "object",
                    "properties": {
                        "status": {"type": "string"},
                        "backend": {"type": "string", "enum": ["postgres", "memory"]}
                    }
                },
                "CampaignStats": {
                    "type": "object",
                    "properties": {
                        "recipient_count": {"type": "integer"},
                        "sent_count": {"type": "integer"},
                        "opened_count": {"type": "integer", "description": "Recipients that opened at least once"},
                        "clicked_count": {"type": "integer", "description": "Recipients that clicked at least once"},
                        "total_opens": {"type": "integer"},
                        "total_clicks": {"type": "integer"},
                        "open_rate": {"type": "number"},
                        "click_rate": {"type": "number"}
                    }
                },
                "CampaignPerformance": {
                    "allOf": [
                        {
                            "type": "object",
                            "properties": {
                                "id": {"type": "string", "format": "uuid"},
                                "name": {"type": "string"},
                                "subject": {"type": "string"},
                                "status": {"type": "string", "enum": ["draft", "scheduled", "sent"]},
                                "created_at": {"type": "string", "format": "date-time"}
                            }
                        },
                        schema_ref("CampaignStats")
                    ]
                },
                "Campaign": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "format": "uuid"},
                        "name": {"type": "string"},
                        "subject": {"type": "string"},
                        "from_email": {"type": "string"},
                        "from_name": {"type": "string"},
                        "html_content": {"type": "string"},
                        "status": {"type": "string", "enum": ["draft", "scheduled", "sent"]},
                        "created_at": {"type": "string", "format": "date-time"}
                    }
                },
                "CreateCampaignRequest": {
                    "type": "object",
                    "required": ["name", "subject", "from_email", "from_name", "html_content"],
                    "properties": {
                        "name": {"type": "string"},
                        "subject": {"type": "string"},
                        "from_email": {"type": "string"},
                        "from_name": {"type": "string"},
                        "html_content": {"type": "string"}
                    }
                },
                "Recipient": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "format": "uuid"},
                        "campaign_id": {"type": "string", "format": "uuid"},
                        "email": {"type": "string"},
                        "name": {"type": "string", "nullable": true},
                        "sent_at": {"type": "string", "format": "date-time", "nullable": true},
                        "opened_at": {"type": "string", "format": "date-time", "nullable": true},
                        "opened_count": {"type": "integer"},
                        "clicked_at": {"type": "string", "format": "date-time", "nullable": true},
                        "clicked_count": {"type": "integer"},
                        "created_at": {"type": "string", "format": "date-time"}
                    }
                },
                "ActivityEntry": {
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "format": "uuid"},
                        "recipient_id": {"type": "string", "format": "uuid"},
                        "event_type": {"type": "string", "enum": ["open", "click"]},
                        "link_url": {"type": "string", "nullable": true},
                        "ip_address": {"type": "string", "nullable": true},
                        "user_agent": {"type": "string", "nullable": true},
                        "created_at": {"type": "string", "format": "date-time"},
                        "email": {"type": "string"},
                        "name": {"type": "string", "nullable": true},
                        "campaign_id": {"type": "string", "format": "uuid"},
                        "campaign_name": {"type": "string"}
                    }
                },
                "AnalyticsReport": {
                    "type": "object",
                    "properties": {
                        "overall": schema_ref("CampaignStats"),
                        "campaigns": array_of("CampaignPerformance"),
                        "recent_events": array_of("ActivityEntry")
                    }
                },
                "DailyActivity": {
                    "type": "object",
                    "properties": {
                        "date": {"type": "string", "format": "date"},
                        "opens": {"type": "integer"},
                        "clicks": {"type": "integer"}
                    }
                },
                "CounterDrift": {
                    "type": "object",
                    "properties": {
                        "recipient_id": {"type": "string", "format": "uuid"},
                        "email": {"type": "string"},
                        "opened_count": {"type": "integer"},
                        "logged_opens": {"type": "integer"},
                        "clicked_count": {"type": "integer"},
                        "logged_clicks": {"type": "integer"}
                    }
                },
                "SendEmailRequest": {
                    "type": "object",
                    "required": ["campaign_id", "email"],
                    "properties": {
                        "campaign_id": {"type": "string", "format": "uuid"},
                        "email": {"type": "string", "format": "email"},
                        "name": {"type": "string"}
                    }
                },
                "SendEmailResponse": {
                    "type": "object",
                    "properties": {
                        "success": {"type": "boolean"},
                        "message": {"type": "string"},
                        "recipient_id": {"type": "string", "format": "uuid"}
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_tracking_paths() {
        let spec = get_openapi_spec();
        let paths = spec["paths"].as_object().unwrap();
        assert!(paths.contains_key("/track/open/{id}"));
        assert!(paths.contains_key("/track/click/{id}"));
        assert!(paths.contains_key("/api/send"));
    }

    #[test]
    fn test_schema_refs_resolve() {
        let spec = get_openapi_spec();
        let schemas = spec["components"]["schemas"].as_object().unwrap();
        let text = spec.to_string();
        for (idx, _) in text.match_indices("#/components/schemas/") {
            let rest = &text[idx + "#/components/schemas/".len()..];
            let name: String = rest.chars().take_while(|c| c.is_alphanumeric()).collect();
            assert!(schemas.contains_key(&name), "missing schema {}", name);
        }
    }
}
