use axum::response::Html;
use axum::Json;
use serde_json::{json, Value};

pub const OPENAPI_PATH: &str = "/openapi.json";
pub const DOCS_PATH: &str = "/docs";

/// OpenAPI 3 description of the public API.
pub fn openapi() -> Value {
    let error = json!({ "$ref": "#/components/schemas/Error" });
    let error_response = |description: &str| {
        json!({
            "description": description,
            "content": { "application/json": { "schema": error } }
        })
    };

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": "IMEI Extractor API",
            "description": "Upload a PDF or image to extract valid 15-digit IMEI numbers using text extraction and OCR.",
            "version": env!("CARGO_PKG_VERSION")
        },
        "paths": {
            "/extract-imei/": {
                "post": {
                    "summary": "Extract IMEI numbers from a document",
                    "operationId": "extract_imei",
                    "requestBody": {
                        "required": true,
                        "content": {
                            "multipart/form-data": {
                                "schema": {
                                    "type": "object",
                                    "required": ["file"],
                                    "properties": {
                                        "file": { "type": "string", "format": "binary" }
                                    }
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "description": "Extraction succeeded",
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ExtractResponse" }
                                }
                            }
                        },
                        "400": error_response("Missing file field or malformed multipart body"),
                        "413": error_response("Upload exceeds the configured size limit"),
                        "415": error_response("File is neither a PDF nor a supported image"),
                        "422": error_response("Text extraction and OCR could not read the file"),
                        "504": error_response("Extraction exceeded the request timeout")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Liveness check",
                    "responses": { "200": { "description": "Service is up" } }
                }
            }
        },
        "components": {
            "schemas": {
                "ExtractResponse": {
                    "type": "object",
                    "required": ["filename", "method_used", "imeis", "num_chars_extracted", "num_imeis_found"],
                    "properties": {
                        "filename": { "type": "string" },
                        "method_used": { "type": "string", "enum": ["pdfplumber", "ocr"] },
                        "imeis": {
                            "type": "array",
                            "items": { "type": "string", "pattern": "^[0-9]{15}$" }
                        },
                        "num_chars_extracted": { "type": "integer", "minimum": 0 },
                        "num_imeis_found": { "type": "integer", "minimum": 0 }
                    }
                },
                "Error": {
                    "type": "object",
                    "required": ["detail"],
                    "properties": { "detail": { "type": "string" } }
                }
            }
        }
    })
}

pub async fn openapi_json() -> Json<Value> {
    Json(openapi())
}

pub async fn docs_page() -> Html<&'static str> {
    Html(DOCS_HTML)
}

const DOCS_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>IMEI Extractor API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({ url: "/openapi.json", dom_id: "#swagger-ui" });
  </script>
</body>
</html>
"##;
