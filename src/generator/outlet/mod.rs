use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::types::{Briefing, BriefingOutcome, SourceRecord};
use crate::utils::text::file_stem;

/// 财务数据为空时的展示文案
pub const NO_FIGURES_NOTICE: &str = "该来源中没有明确的财务数据。";

/// 流水线结果的输出端
pub trait Outlet {
    fn emit(&self, outcome: &BriefingOutcome) -> Result<()>;
}

/// 将结果打印到终端
#[derive(Default)]
pub struct TerminalOutlet;

impl TerminalOutlet {
    /// 生成终端展示文本
    pub fn render(&self, outcome: &BriefingOutcome) -> String {
        let mut out = String::new();
        // 写入 String 不会失败
        let _ = write_outcome(&mut out, outcome);
        out
    }
}

fn write_outcome(out: &mut String, outcome: &BriefingOutcome) -> std::fmt::Result {
    match outcome {
        BriefingOutcome::InputTooShort { industry, min_chars } => writeln!(
            out,
            "⚠️ \"{}\" 太短，请输入至少 {} 个字符的行业名称。",
            industry, min_chars
        ),
        BriefingOutcome::Rejected { industry, verdict } => {
            writeln!(out, "❌ \"{}\" 不是一个可识别的行业。", industry)?;
            if !verdict.reason.is_empty() {
                writeln!(out, "   原因: {}", verdict.reason)?;
            }
            if !verdict.suggestions.is_empty() {
                writeln!(out, "   你是否想查询: {}", verdict.suggestions.join("、"))?;
            }
            Ok(())
        }
        BriefingOutcome::NoSourcesFound { industry, queries } => {
            writeln!(out, "⚠️ 没有找到与 \"{}\" 相关的 Wikipedia 文档。", industry)?;
            writeln!(out, "   已尝试的查询:")?;
            for query in queries {
                writeln!(out, "   - {}", query)?;
            }
            write_remediation(out)
        }
        BriefingOutcome::DataGap {
            industry,
            raw_titles,
            ..
        } => {
            writeln!(
                out,
                "⚠️ 数据缺口: 检索到 {} 篇文档，但没有一篇能支撑 \"{}\" 的行业报告。",
                raw_titles.len(),
                industry
            )?;
            write_remediation(out)
        }
        BriefingOutcome::Completed(briefing) => write_briefing(out, briefing),
    }
}

fn write_remediation(out: &mut String) -> std::fmt::Result {
    writeln!(out, "💡 建议:")?;
    writeln!(out, "   - 使用更具体的行业名称（例如用 \"Electric vehicles\" 代替 \"Cars\"）")?;
    writeln!(out, "   - 使用标准的行业术语")?;
    writeln!(out, "   - 尝试一个相近的细分领域")
}

fn write_briefing(out: &mut String, briefing: &Briefing) -> std::fmt::Result {
    writeln!(
        out,
        "🕒 生成时间: {}",
        briefing.generated_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out, "\n🧭 检索查询:")?;
    for query in &briefing.queries {
        writeln!(out, "   - {}", query)?;
    }

    writeln!(out, "\n📚 检索到的文档 ({}):", briefing.raw_titles.len())?;
    for title in &briefing.raw_titles {
        writeln!(out, "   - {}", title)?;
    }

    writeln!(out, "\n🔗 报告来源:")?;
    for source in &briefing.sources {
        write_source(out, source)?;
    }

    writeln!(out, "\n{}", "=".repeat(60))?;
    writeln!(out, "{}", render_plain_text(briefing))?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(
        out,
        "📏 共 {} 个单词，{} 处引用标记",
        briefing.report.word_count(),
        briefing.citation_audit.total_markers
    )
}

fn write_source(out: &mut String, source: &SourceRecord) -> std::fmt::Result {
    writeln!(out, "\n   [{}] {}", source.ordinal, source.title)?;
    writeln!(out, "       {}", source.url)?;
    if source.has_figures() {
        for line in source.figures.lines() {
            writeln!(out, "       {}", line)?;
        }
        Ok(())
    } else {
        writeln!(out, "       {}", NO_FIGURES_NOTICE)
    }
}

impl Outlet for TerminalOutlet {
    fn emit(&self, outcome: &BriefingOutcome) -> Result<()> {
        println!("{}", self.render(outcome));
        Ok(())
    }
}

/// 带大写行业标题的纯文本报告
pub fn render_plain_text(briefing: &Briefing) -> String {
    format!(
        "INDUSTRY REPORT: {}\n\n{}",
        briefing.industry.to_uppercase(),
        briefing.report.markdown
    )
}

/// 将完成的报告保存到输出目录
pub struct DiskOutlet {
    output_dir: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn report_path(&self, industry: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_report.txt", file_stem(industry)))
    }

    /// 未完成的结果不写文件，返回 None
    pub fn save(&self, outcome: &BriefingOutcome) -> Result<Option<PathBuf>> {
        let Some(briefing) = outcome.briefing() else {
            return Ok(None);
        };

        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("无法创建输出目录: {}", self.output_dir.display())
        })?;

        let path = self.report_path(&briefing.industry);
        fs::write(&path, render_plain_text(briefing))
            .with_context(|| format!("无法写入报告: {}", path.display()))?;

        Ok(Some(path))
    }
}

impl Outlet for DiskOutlet {
    fn emit(&self, outcome: &BriefingOutcome) -> Result<()> {
        if let Some(path) = self.save(outcome)? {
            println!("💾 已保存报告: {}", path.display());
        }
        Ok(())
    }
}
