// Integration tests for company research against a mocked responses API

use anyhow::Result;
use callcoach::config::EnrichmentConfig;
use callcoach::enrichment::{parse_profile, CompanyResearch, ResearchRequest, ResponsesClient};
use callcoach::Error;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> Result<ResponsesClient> {
    Ok(ResponsesClient::new(EnrichmentConfig {
        api_base: server.uri(),
        api_key: Some("sk-test".to_string()),
        model: "gpt-4o".to_string(),
        timeout_secs: 5,
    })?)
}

fn request(name: &str) -> ResearchRequest {
    ResearchRequest {
        company_name: name.to_string(),
        company_website: None,
    }
}

#[tokio::test]
async fn test_research_parses_wrapped_json() -> Result<()> {
    let server = MockServer::start().await;
    let answer = "Aqui está:\n```json\n{\"nome\": \"Decision Maker\", \"empresa\": \"Lusomar\", \
                  \"setor\": \"logística\", \"tamanho_equipa\": 120, \"urgencia\": \"alta\", \
                  \"experiencia_ia\": \"básica\", \"insights\": \"- Expansão para Espanha\"}\n```";

    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "tool_choice": "auto",
            "tools": [{ "type": "web_search" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": [
                { "type": "web_search_call", "status": "completed" },
                { "type": "message", "content": [{ "type": "output_text", "text": answer }] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = client_for(&server)?.research(&request("Lusomar")).await?;

    assert_eq!(profile.company.as_deref(), Some("Lusomar"));
    assert_eq!(profile.sector.as_deref(), Some("logística"));
    assert_eq!(profile.team_size, Some(120));
    assert_eq!(profile.urgency.as_deref(), Some("alta"));
    assert_eq!(profile.insights.as_deref(), Some("- Expansão para Espanha"));
    Ok(())
}

#[tokio::test]
async fn test_research_api_error() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = client_for(&server)?
        .research(&request("Lusomar"))
        .await
        .unwrap_err();

    match err {
        Error::Enrichment(msg) => assert!(msg.contains("429"), "unexpected message: {}", msg),
        other => panic!("expected enrichment error, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_research_empty_output() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": [] })))
        .mount(&server)
        .await;

    let err = client_for(&server)?
        .research(&request("Lusomar"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Enrichment(_)));
    Ok(())
}

#[tokio::test]
async fn test_research_requires_company_name() -> Result<()> {
    let server = MockServer::start().await;

    let err = client_for(&server)?
        .research(&request("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}

#[test]
fn test_non_json_output_is_an_enrichment_error() {
    assert!(matches!(
        parse_profile("I could not find that company."),
        Err(Error::Enrichment(_))
    ));
    assert!(matches!(parse_profile("  "), Err(Error::Enrichment(_))));
}
