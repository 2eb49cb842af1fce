use crate::config::Config;
use crate::generator::citations::CitationAudit;
use crate::generator::context::GeneratorContext;
use crate::generator::outlet::{DiskOutlet, Outlet, TerminalOutlet};
use crate::generator::stages::{
    filter_documents, generate_queries, generate_report, retrieve_documents, validate_industry,
};
use crate::generator::types::{Briefing, BriefingOutcome};
use crate::llm::OracleFactory;

use anyhow::Result;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<&'static str, Instant>,
    phase_durations: Vec<(&'static str, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &'static str) {
        self.phase_start_times.insert(phase_name, Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &'static str) -> Option<Duration> {
        let start_time = self.phase_start_times.remove(phase_name)?;
        let duration = start_time.elapsed();
        self.phase_durations.push((phase_name, duration));
        Some(duration)
    }

    pub fn total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 按结束顺序返回各阶段耗时
    pub fn phase_durations(&self) -> &[(&'static str, Duration)] {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.total_duration().as_secs_f64()
        );

        if !self.phase_durations.is_empty() {
            report.push_str("\n各阶段执行时间:\n");
            for (phase, duration) in &self.phase_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", phase, duration.as_secs_f64()));
            }
        }

        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const VALIDATE: &'static str = "validate";
    pub const PLAN: &'static str = "plan";
    pub const RETRIEVE: &'static str = "retrieve";
    pub const FILTER: &'static str = "filter";
    pub const REPORT: &'static str = "report";
}

/// 执行完整流水线。
///
/// 输入不可回答（过短、被拒、无文档）时返回对应的 [`BriefingOutcome`]，
/// 只有服务异常才会返回错误。
pub async fn run_pipeline(context: &GeneratorContext, industry: &str) -> Result<BriefingOutcome> {
    let industry = industry.trim().to_string();
    let pipeline = &context.config.pipeline;
    let mut timing = TimingScope::new();

    if industry.chars().count() < pipeline.min_input_chars {
        tracing::info!(industry = %industry, "input too short");
        return Ok(BriefingOutcome::InputTooShort {
            industry,
            min_chars: pipeline.min_input_chars,
        });
    }

    println!("🔍 正在校验行业名称: {}", industry);
    timing.start_phase(TimingKeys::VALIDATE);
    let verdict = validate_industry(context, &industry).await?;
    timing.end_phase(TimingKeys::VALIDATE);
    if !verdict.accepted {
        tracing::info!(industry = %industry, reason = %verdict.reason, "industry rejected");
        return Ok(BriefingOutcome::Rejected { industry, verdict });
    }

    println!("🧭 正在规划检索查询...");
    timing.start_phase(TimingKeys::PLAN);
    let queries = generate_queries(context, &industry).await?;
    timing.end_phase(TimingKeys::PLAN);
    for query in &queries {
        println!("   - {}", query);
    }

    println!("📚 正在检索 Wikipedia...");
    timing.start_phase(TimingKeys::RETRIEVE);
    let raw = retrieve_documents(context, &queries).await;
    timing.end_phase(TimingKeys::RETRIEVE);
    println!("   ✅ 共找到 {} 篇文档", raw.len());
    if raw.is_empty() {
        return Ok(BriefingOutcome::NoSourcesFound { industry, queries });
    }
    let raw_titles = raw.titles();

    println!("🧹 正在筛选相关文档...");
    timing.start_phase(TimingKeys::FILTER);
    let documents = filter_documents(context, &raw, &industry).await?;
    timing.end_phase(TimingKeys::FILTER);
    if documents.is_empty() {
        tracing::info!(industry = %industry, "no documents survived filtering");
        return Ok(BriefingOutcome::DataGap {
            industry,
            queries,
            raw_titles,
        });
    }

    println!("📝 正在基于 {} 篇文档生成报告...", documents.len());
    timing.start_phase(TimingKeys::REPORT);
    let generated = generate_report(context, &documents, &industry).await?;
    timing.end_phase(TimingKeys::REPORT);

    let citation_audit = CitationAudit::audit(&generated.report.markdown, &generated.sources);
    if !citation_audit.is_clean() {
        tracing::warn!(
            markers = citation_audit.total_markers,
            out_of_range = ?citation_audit.out_of_range,
            mismatched = ?citation_audit.mismatched_urls,
            "report citations do not line up with the selected sources"
        );
    }
    let uncited = citation_audit.uncited(&generated.sources);
    if !uncited.is_empty() {
        tracing::debug!(uncited = ?uncited, "some sources were never cited");
    }

    println!("\n⏱️ {}", timing.generate_timing_report());

    Ok(BriefingOutcome::Completed(Box::new(Briefing {
        industry,
        queries,
        raw_titles,
        sources: generated.sources,
        figures_text: generated.figures_text,
        report: generated.report,
        citation_audit,
        generated_at: chrono::Local::now(),
    })))
}

/// 按配置构建依赖、执行流水线并输出结果
pub async fn launch(config: &Config, industry: &str) -> Result<BriefingOutcome> {
    config.validate()?;

    let mut factory = OracleFactory::new();
    let context = GeneratorContext::from_config(config.clone(), &mut factory)?;

    let outcome = run_pipeline(&context, industry).await?;
    tracing::info!(
        industry = %outcome.industry(),
        completed = outcome.is_completed(),
        "pipeline finished"
    );

    TerminalOutlet.emit(&outcome)?;
    if config.save_report {
        DiskOutlet::new(&config.output_path).emit(&outcome)?;
    }

    Ok(outcome)
}
