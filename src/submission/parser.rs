use axum::http::HeaderMap;
use bytes::Bytes;
use serde_json::{Map, Value};

/// A file part from a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn is_pdf(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.eq_ignore_ascii_case("application/pdf"))
    }
}

#[derive(Debug, Default)]
pub struct MultipartBody {
    pub fields: Map<String, Value>,
    pub files: Vec<UploadedFile>,
}

/// Parse a request body into a JSON object based on its Content-Type.
///
/// Multipart bodies are handled by [`parse_multipart`]; file parts are dropped
/// here since submissions carry text fields only.
pub async fn parse_request(headers: &HeaderMap, body: Bytes) -> Result<Value, String> {
    let content_type = headers.get("content-type").and_then(|v| v.to_str().ok());

    if content_type.is_some_and(|ct| ct.contains("multipart/form-data")) {
        let parsed = parse_multipart(headers, body).await?;
        return Ok(Value::Object(parsed.fields));
    }

    parse_body(content_type, &body)
}

pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<Value, String> {
    let ct = content_type.unwrap_or("application/json");

    let value = if ct.contains("application/json") {
        serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)?
    } else {
        serde_json::from_slice(body)
            .or_else(|_| parse_form_urlencoded(body))
            .map_err(|e| format!("Unable to parse body: {e}"))?
    };

    if !value.is_object() {
        return Err("Request body must be an object".to_string());
    }
    Ok(value)
}

fn parse_form_urlencoded(body: &[u8]) -> Result<Value, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    let map: Map<String, Value> = form_urlencoded::parse(body_str.as_bytes())
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();
    Ok(Value::Object(map))
}

/// Parse multipart form data using multer, separating text fields from files.
pub async fn parse_multipart(headers: &HeaderMap, body: Bytes) -> Result<MultipartBody, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut parsed = MultipartBody::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let name = field.name().unwrap_or("unknown").to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(|m| m.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| format!("File read error: {e}"))?;
            parsed.files.push(UploadedFile {
                field_name: name,
                file_name,
                content_type,
                bytes,
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        parsed.fields.insert(name, Value::String(value));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const BOUNDARY: &str = "X-BOUNDARY";

    fn multipart_headers() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(
            "content-type",
            HeaderValue::from_str(&format!("multipart/form-data; boundary={BOUNDARY}")).unwrap(),
        );
        h
    }

    fn multipart_body() -> Bytes {
        Bytes::from(format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"projectTitle\"\r\n\r\n\
             Reef Restoration\r\n\
             --{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"paper.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             %PDF-1.4\r\n\
             --{BOUNDARY}--\r\n"
        ))
    }

    #[test]
    fn urlencoded_keeps_strings() {
        let v = parse_body(
            Some("application/x-www-form-urlencoded"),
            b"projectTitle=Reef+Work&durationMonths=12",
        )
        .unwrap();
        assert_eq!(v["projectTitle"], "Reef Work");
        assert_eq!(v["durationMonths"], "12");
    }

    #[test]
    fn json_must_be_object() {
        assert!(parse_body(Some("application/json"), b"[1,2]").is_err());
        assert!(parse_body(Some("application/json"), b"{bad").is_err());
        assert!(parse_body(None, br#"{"a":1}"#).is_ok());
    }

    #[tokio::test]
    async fn multipart_splits_fields_and_files() {
        let parsed = parse_multipart(&multipart_headers(), multipart_body())
            .await
            .unwrap();
        assert_eq!(parsed.fields["projectTitle"], "Reef Restoration");
        assert_eq!(parsed.files.len(), 1);
        let file = &parsed.files[0];
        assert_eq!(file.field_name, "file");
        assert_eq!(file.file_name, "paper.pdf");
        assert!(file.is_pdf());
        assert_eq!(&file.bytes[..], b"%PDF-1.4");
    }

    #[tokio::test]
    async fn request_parsing_drops_files() {
        let v = parse_request(&multipart_headers(), multipart_body())
            .await
            .unwrap();
        assert_eq!(v.as_object().unwrap().len(), 1);
    }
}
