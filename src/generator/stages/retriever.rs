use futures::stream::{self, StreamExt};

use crate::generator::context::GeneratorContext;
use crate::generator::types::DocumentSet;

/// 执行全部检索查询并按标题去重。
///
/// 单条查询失败只记录告警，不影响其余查询；结果顺序与查询顺序一致，
/// 与并发度无关。
pub async fn retrieve_documents(context: &GeneratorContext, queries: &[String]) -> DocumentSet {
    let source = context.documents.as_ref();
    let limit = context.config.wikipedia.max_results;
    let parallels = context.config.pipeline.max_parallels.max(1);

    let results: Vec<_> = stream::iter(queries)
        .map(|query| async move { (query, source.search(query, limit).await) })
        .buffered(parallels)
        .collect()
        .await;

    let mut documents = DocumentSet::new();
    let mut failed = 0usize;
    for (query, result) in results {
        match result {
            Ok(found) => {
                tracing::debug!(query = %query, count = found.len(), "retrieved documents");
                documents.extend(found);
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(query = %query, error = %e, "retrieval query failed, skipping");
            }
        }
    }

    if failed > 0 {
        println!("   ⚠️ {} / {} 条检索查询失败，已跳过", failed, queries.len());
    }

    documents
}
