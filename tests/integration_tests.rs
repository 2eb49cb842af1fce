use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use market_brief::config::{Config, WikipediaConfig};
use market_brief::generator::outlet::DiskOutlet;
use market_brief::sources::{SourceError, WikipediaClient};
use market_brief::{BriefingOutcome, Document, DocumentSource, GeneratorContext, Oracle, run_pipeline};

/// 按 prompt 开头选择回复的模型替身
struct RoutedOracle {
    routes: Vec<(&'static str, Result<String, String>)>,
    prompts: Mutex<Vec<String>>,
}

impl RoutedOracle {
    fn new() -> Self {
        Self {
            routes: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn route(mut self, prefix: &'static str, reply: &str) -> Self {
        self.routes.push((prefix, Ok(reply.to_string())));
        self
    }

    fn fail(mut self, prefix: &'static str) -> Self {
        self.routes.push((prefix, Err(format!("{} unavailable", prefix))));
        self
    }

    fn prompts_starting_with(&self, prefix: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl Oracle for RoutedOracle {
    async fn invoke(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.routes
            .iter()
            .find(|(prefix, _)| prompt.starts_with(prefix))
            .map(|(_, reply)| reply.clone().map_err(|e| anyhow!(e)))
            .unwrap_or_else(|| Err(anyhow!("no scripted reply for prompt")))
    }
}

const VALIDATOR: &str = "You are an input validator";
const PLANNER: &str = "You are the research query planner";
const BOUNCER: &str = "You are a source quality filter";
const EXTRACTOR: &str = "You are a financial data extractor";
const SYNTHESIZER: &str = "ROLE:";

/// 内存中的文档服务
#[derive(Default)]
struct MemorySource {
    results: HashMap<String, Vec<Document>>,
    queries: Mutex<Vec<String>>,
}

impl MemorySource {
    fn with(mut self, query: &str, titles: &[&str]) -> Self {
        let documents = titles
            .iter()
            .map(|t| {
                Document::new(
                    *t,
                    format!("https://en.wikipedia.org/wiki/{}", t.replace(' ', "_")),
                    format!("{} is described here.", t),
                )
            })
            .collect();
        self.results.insert(query.to_string(), documents);
        self
    }

    fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Document>, SourceError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self
            .results
            .get(query)
            .map(|docs| docs.iter().take(max_results).cloned().collect())
            .unwrap_or_default())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.llm.api_key = "test-key".to_string();
    config
}

async fn mount_search(server: &MockServer, query: &str, titles: &[&str]) {
    let hits: Vec<_> = titles
        .iter()
        .map(|t| serde_json::json!({ "ns": 0, "title": t }))
        .collect();
    Mock::given(method("GET"))
        .and(query_param("list", "search"))
        .and(query_param("srsearch", query))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "query": { "search": hits } })),
        )
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, title: &str, extract: &str) {
    Mock::given(method("GET"))
        .and(query_param("titles", title))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": { "pages": [{
                "title": title,
                "extract": extract,
                "fullurl": format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_"))
            }] }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_healthcare_briefing_end_to_end() {
    let server = MockServer::start().await;
    mount_search(&server, "Health care", &["Health care", "Hospital"]).await;
    mount_search(&server, "Health care industry", &["Health care industry", "Health care"]).await;
    mount_search(&server, "Pharmaceutical industry", &["Pharmaceutical industry"]).await;
    mount_page(&server, "Health care", "Health care spending reached US$9.8 trillion in 2021.").await;
    mount_page(&server, "Hospital", "A hospital is a health care institution.").await;
    mount_page(&server, "Health care industry", "The health care industry comprises sectors.").await;
    mount_page(&server, "Pharmaceutical industry", "The pharmaceutical industry discovers drugs.").await;
    // 其余查询返回空结果
    Mock::given(method("GET"))
        .and(query_param("list", "search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "query": { "search": [] } })),
        )
        .with_priority(10)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.wikipedia = WikipediaConfig {
        api_base_url: Some(format!("{}/w/api.php", server.uri())),
        ..Default::default()
    };

    let oracle = Arc::new(
        RoutedOracle::new()
            .route(VALIDATOR, "VALID")
            .route(
                PLANNER,
                "QUERIES:\n- Health care\n- Health care industry\n- Pharmaceutical industry\n- Health economics\n- Health policy",
            )
            .route(BOUNCER, "Health care, Health care industry, Pharmaceutical industry")
            .route(EXTRACTOR, "• US$9.8 trillion — global health care spending in 2021")
            .route(
                SYNTHESIZER,
                "## 1. Industry Overview & Market Value\n\nGlobal spending reached US$9.8 trillion [SOURCE 1](https://en.wikipedia.org/wiki/Health_care).",
            ),
    );
    let source = Arc::new(WikipediaClient::new(config.wikipedia.clone()).unwrap());
    let context = GeneratorContext::new(oracle.clone(), source, config);

    let outcome = run_pipeline(&context, "Healthcare").await.unwrap();

    let briefing = outcome.briefing().expect("briefing should complete");
    assert_eq!(briefing.queries.len(), 5);
    assert!(!briefing.raw_titles.is_empty());
    assert!(briefing.sources.len() <= 5);
    assert_eq!(briefing.sources[0].title, "Health care");
    assert!(briefing.report.markdown.contains("[SOURCE"));
    assert!(briefing.citation_audit.is_clean());
    assert_eq!(oracle.prompts_starting_with(EXTRACTOR), briefing.sources.len());

    let temp_dir = TempDir::new().unwrap();
    let path = DiskOutlet::new(temp_dir.path())
        .save(&outcome)
        .unwrap()
        .unwrap();
    let saved = std::fs::read_to_string(path).unwrap();
    assert!(saved.starts_with("INDUSTRY REPORT: HEALTHCARE\n\n"));
}

#[tokio::test]
async fn test_non_business_input_is_rejected_before_retrieval() {
    let oracle = Arc::new(RoutedOracle::new().route(
        VALIDATOR,
        "INVALID - \"purple\" is a colour, not a business sector.\nSUGGESTIONS: Paint manufacturing, Textile dyeing, Cosmetics",
    ));
    let source = Arc::new(MemorySource::default());
    let context = GeneratorContext::new(oracle.clone(), source.clone(), test_config());

    let outcome = run_pipeline(&context, "purple").await.unwrap();

    match outcome {
        BriefingOutcome::Rejected { verdict, .. } => {
            assert!(!verdict.accepted);
            assert!(!verdict.reason.is_empty());
            assert!(!verdict.suggestions.is_empty());
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(source.query_count(), 0);
    assert_eq!(oracle.prompts_starting_with(PLANNER), 0);
}

#[tokio::test]
async fn test_unknown_industry_ends_in_data_gap() {
    let industry = "xyzzy123nonexistent";
    let oracle = Arc::new(
        RoutedOracle::new()
            .route(VALIDATOR, "VALID")
            .route(PLANNER, "QUERIES:\n- xyzzy123nonexistent industry\n- xyzzy123nonexistent market")
            .route(BOUNCER, "None of these")
            .route(SYNTHESIZER, "should never be used"),
    );
    let source = Arc::new(
        MemorySource::default()
            .with("xyzzy123nonexistent industry", &["Xyzzy (computing)", "Colossal Cave Adventure"])
            .with(industry, &["Xyzzy (computing)"]),
    );
    let context = GeneratorContext::new(oracle.clone(), source.clone(), test_config());

    let outcome = run_pipeline(&context, industry).await.unwrap();

    match outcome {
        BriefingOutcome::DataGap { raw_titles, .. } => {
            assert_eq!(raw_titles, vec!["Xyzzy (computing)", "Colossal Cave Adventure"]);
        }
        other => panic!("expected data gap, got {:?}", other),
    }
    // 两条规划查询 + 四条扩展查询
    assert_eq!(source.query_count(), 6);
    assert_eq!(oracle.prompts_starting_with(EXTRACTOR), 0);
    assert_eq!(oracle.prompts_starting_with(SYNTHESIZER), 0);
}

#[tokio::test]
async fn test_figure_extraction_failure_degrades_to_sentinel() {
    let oracle = Arc::new(
        RoutedOracle::new()
            .route(VALIDATOR, "VALID")
            .route(PLANNER, "QUERIES:\n- Tea")
            .route(BOUNCER, "Tea, Tea production")
            .fail(EXTRACTOR)
            .route(
                SYNTHESIZER,
                "## 1. Industry Overview & Market Value\n\nNo numerical market size data provided in sources. [SOURCE 1](https://en.wikipedia.org/wiki/Tea)",
            ),
    );
    let source = Arc::new(MemorySource::default().with("Tea", &["Tea", "Tea production", "Teapot"]));
    let context = GeneratorContext::new(oracle.clone(), source, test_config());

    let outcome = run_pipeline(&context, "Tea").await.unwrap();

    let briefing = outcome.briefing().expect("briefing should complete");
    assert!(!briefing.sources.is_empty());
    for record in &briefing.sources {
        assert_eq!(record.figures, "None");
        assert!(!record.has_figures());
    }
    assert!(briefing.figures_text.contains("SOURCE 1 — Tea:\nNone"));
    assert!(!briefing.report.markdown.is_empty());
}
