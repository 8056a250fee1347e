use coldmail::app::build_pipeline;
use coldmail::domain::model::{RunOutcome, Stage};
use coldmail::domain::ports::VectorIndex;
use coldmail::{OutreachEngine, OutreachError, TomlConfig};
use httpmock::prelude::*;
use tempfile::TempDir;

const PRIMARY: &str = "llama-3.3-70b-versatile";
const FALLBACK: &str = "llama-3.1-8b-instant";

const CAREERS_PAGE: &str = r#"<html><head><title>Careers at Acme</title>
<script>window.analytics = {};</script></head>
<body><h1>Backend Engineer</h1><p>3+ years building services in Go and SQL.</p>
<p>Location: Remote</p></body></html>"#;

const PORTFOLIO_CSV: &str = "Techstack,Links\n\
\"React, TypeScript\",https://example.com/react-portfolio\n\
\"Go, PostgreSQL\",https://example.com/go-portfolio\n\
\"Python, SQL\",https://example.com/python-portfolio\n";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("my_portfolio.csv"), PORTFOLIO_CSV).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_str().unwrap().to_string()
    }

    fn config(&self, api_base_url: &str, save_email: bool) -> TomlConfig {
        let toml = format!(
            r#"
[model]
api_base_url = "{api}"
api_key = "gsk_test"

[portfolio]
csv_path = "{csv}"
vectorstore_path = "{store}"
neighbors_per_skill = 1

[profile]
name = "Ada Lovelace"
headline = "Backend engineer with 4 years of Go"
github = "https://github.com/ada"

[output]
path = "{output}"
save_email = {save_email}
"#,
            api = api_base_url,
            csv = self.path("my_portfolio.csv"),
            store = self.path("vectorstore"),
            output = self.path("output"),
            save_email = save_email,
        );
        TomlConfig::from_toml_str(&toml).unwrap()
    }
}

fn model_body(model: &str) -> String {
    format!("\"model\":\"{}\"", model)
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

fn backend_postings() -> String {
    serde_json::json!([{
        "role": "Backend Engineer",
        "experience": "3+ years",
        "skills": ["Go", "SQL"],
        "location": "Remote",
        "description": "Build and operate payment services"
    }])
    .to_string()
}

fn mock_careers_page(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/careers");
        then.status(200)
            .header("Content-Type", "text/html")
            .body(CAREERS_PAGE);
    })
}

#[tokio::test]
async fn test_end_to_end_backend_engineer() {
    let workspace = Workspace::new();
    let server = MockServer::start();
    let page_mock = mock_careers_page(&server);

    let extract_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("### SCRAPED TEXT FROM WEBSITE")
            .body_contains("Backend Engineer")
            .body_contains(model_body(PRIMARY));
        then.status(200).json_body(completion(&backend_postings()));
    });
    let email_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("### JOB DESCRIPTION")
            .body_contains("Skills: Go, SQL")
            .body_contains("Tech stack from my portfolio: Go, PostgreSQL, Python, SQL")
            .body_contains("- Name: Ada Lovelace")
            .body_contains(model_body(PRIMARY));
        then.status(200)
            .json_body(completion("Subject: Backend Engineer\n\nDear Hiring Manager,"));
    });

    let config = workspace.config(&server.base_url(), true);
    let engine = OutreachEngine::new(build_pipeline(&config).await.unwrap());
    let outcome = engine.run(&server.url("/careers")).await.unwrap();

    page_mock.assert();
    extract_mock.assert();
    email_mock.assert();

    let report = match outcome {
        RunOutcome::Completed(report) => report,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(report.job.role, "Backend Engineer");
    assert_eq!(report.job.skills, vec!["Go", "SQL"]);
    assert_eq!(
        report.matches.tech_stacks,
        vec!["Go, PostgreSQL", "Python, SQL"]
    );
    assert_eq!(
        report.matches.links,
        vec![
            "https://example.com/go-portfolio",
            "https://example.com/python-portfolio"
        ]
    );
    assert!(report.fallbacks.is_empty());
    assert!(report.email.starts_with("Subject: Backend Engineer"));

    // Email is saved under the output directory
    let saved = report.output_path.expect("email should be saved");
    assert!(saved.contains("job_application_Backend_Engineer_"));
    assert_eq!(std::fs::read_to_string(&saved).unwrap(), report.email);

    // The index was populated and persisted
    assert_eq!(engine.pipeline().index().count().await.unwrap(), 3);
    assert!(std::path::Path::new(&workspace.path("vectorstore"))
        .join("portfolio.json")
        .exists());
}

#[tokio::test]
async fn test_rate_limits_on_both_stages_recover_with_fallback() {
    let workspace = Workspace::new();
    let server = MockServer::start();
    mock_careers_page(&server);

    let primary_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains(model_body(PRIMARY));
        then.status(429).json_body(serde_json::json!({
            "error": {"message": "Rate limit reached", "type": "tokens", "code": "rate_limit_exceeded"}
        }));
    });
    let fallback_extract_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("### SCRAPED TEXT FROM WEBSITE")
            .body_contains(model_body(FALLBACK));
        then.status(200).json_body(completion(&backend_postings()));
    });
    let fallback_email_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("### JOB DESCRIPTION")
            .body_contains(model_body(FALLBACK));
        then.status(200).json_body(completion("Dear Hiring Manager,"));
    });

    let config = workspace.config(&server.base_url(), false);
    let engine = OutreachEngine::new(build_pipeline(&config).await.unwrap());
    let outcome = engine.run(&server.url("/careers")).await.unwrap();

    primary_mock.assert_hits(2);
    fallback_extract_mock.assert();
    fallback_email_mock.assert();

    let RunOutcome::Completed(report) = outcome else {
        panic!("expected a completed run");
    };
    let stages: Vec<Stage> = report.fallbacks.iter().map(|e| e.stage).collect();
    assert_eq!(stages, vec![Stage::Extraction, Stage::Composition]);
    assert!(report
        .fallbacks
        .iter()
        .all(|e| e.primary == PRIMARY && e.fallback == FALLBACK));
    assert_eq!(report.email, "Dear Hiring Manager,");
    assert!(report.output_path.is_none());
}

#[tokio::test]
async fn test_fallback_failure_aborts_run() {
    let workspace = Workspace::new();
    let server = MockServer::start();
    mock_careers_page(&server);

    server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains(model_body(PRIMARY));
        then.status(429).body("{}");
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains(model_body(FALLBACK));
        then.status(500).body("internal error");
    });

    let config = workspace.config(&server.base_url(), true);
    let engine = OutreachEngine::new(build_pipeline(&config).await.unwrap());
    let err = engine.run(&server.url("/careers")).await.unwrap_err();

    match err {
        OutreachError::GenerationError { model, status, .. } => {
            assert_eq!(model, FALLBACK);
            assert_eq!(status, Some(500));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!std::path::Path::new(&workspace.path("output")).exists());
}

#[tokio::test]
async fn test_page_without_postings_reports_no_postings() {
    let workspace = Workspace::new();
    let server = MockServer::start();
    mock_careers_page(&server);

    let email_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("### JOB DESCRIPTION");
        then.status(200).json_body(completion("should not be generated"));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("### SCRAPED TEXT FROM WEBSITE");
        then.status(200)
            .json_body(completion(r#"[{"role": "Backend Engineer", "skills": ["Go"]}]"#));
    });

    let config = workspace.config(&server.base_url(), true);
    let engine = OutreachEngine::new(build_pipeline(&config).await.unwrap());
    let outcome = engine.run(&server.url("/careers")).await.unwrap();

    email_mock.assert_hits(0);
    match outcome {
        RunOutcome::NoPostings { dropped, .. } => assert_eq!(dropped, 1),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_page_fails_before_model_calls() {
    let workspace = Workspace::new();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/careers");
        then.status(404);
    });
    let chat_mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(completion("[]"));
    });

    let config = workspace.config(&server.base_url(), true);
    let engine = OutreachEngine::new(build_pipeline(&config).await.unwrap());
    let err = engine.run(&server.url("/careers")).await.unwrap_err();

    assert!(matches!(err, OutreachError::PageFetchError { .. }));
    chat_mock.assert_hits(0);
}

#[tokio::test]
async fn test_existing_index_is_not_repopulated() {
    let workspace = Workspace::new();
    let server = MockServer::start();
    mock_careers_page(&server);
    server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("### SCRAPED TEXT FROM WEBSITE");
        then.status(200).json_body(completion("[]"));
    });

    let config = workspace.config(&server.base_url(), false);
    for _ in 0..2 {
        let engine = OutreachEngine::new(build_pipeline(&config).await.unwrap());
        engine.run(&server.url("/careers")).await.unwrap();
        assert_eq!(engine.pipeline().index().count().await.unwrap(), 3);
    }
}
