//! Interface de terminal do draftsmith: spinners e saída colorida.
//!
//! Usa as crates `indicatif` para spinners de progresso e `console` para
//! estilização com cores. O [`StepProgress`] acompanha visualmente
//! uma chamada de geração no terminal.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::artifacts::{ArtifactId, ArtifactKind};
use crate::generation::ModelInfo;
use crate::state_machine::{JobSummary, LengthBand};
use crate::stats::{LengthFit, TextStats};
use crate::workflow::{Persisted, StepReport};

/// Indicador visual de progresso para uma geração em andamento.
///
/// Exibe um spinner animado com a contagem de caracteres recebidos e
/// mensagens coloridas para sucesso (verde) e falha (vermelho).
pub struct StepProgress {
    // Barra de progresso/spinner do indicatif.
    pb: ProgressBar,
}

impl StepProgress {
    /// Inicia o spinner com a descrição do passo.
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} ({pos} chars)")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    /// Callback para o workflow: conta cada fragmento recebido.
    pub fn sink(&self) -> impl Fn(&str) + 'static {
        let pb = self.pb.clone();
        move |fragment: &str| pb.inc(fragment.chars().count() as u64)
    }

    /// Finaliza o spinner e remove-o do terminal.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl Drop for StepProgress {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}

fn green() -> Style {
    Style::new().green().bold()
}

fn red() -> Style {
    Style::new().red().bold()
}

fn yellow() -> Style {
    Style::new().yellow()
}

fn dim() -> Style {
    Style::new().dim()
}

pub fn success(message: &str) {
    println!("  {} {message}", green().apply_to("✓"));
}

pub fn warning(message: &str) {
    println!("  {} {message}", yellow().apply_to("!"));
}

pub fn note(message: &str) {
    println!("  {}", dim().apply_to(message));
}

pub fn error(message: &str) {
    eprintln!("  {} {message}", red().apply_to("✗"));
}

/// Imprime o texto produzido por um passo e o destino do artefato.
pub fn print_report(title: &str, report: &StepReport) {
    println!();
    println!("{}", green().apply_to(format!("─── {title} ───")));
    println!("{}", report.text);
    println!();
    match &report.persisted {
        Persisted::Saved(id) => success(&format!("Saved as {id}")),
        Persisted::Failed(reason) => warning(&format!("Not saved: {reason}")),
        Persisted::Ephemeral => {}
    }
    if let Some(changed) = &report.changed_paragraphs {
        note(&changed_summary(changed));
    }
    println!("  {} stage {}", dim().apply_to("→"), report.stage);
}

/// Descreve quais parágrafos mudaram em relação ao rascunho anterior.
fn changed_summary(changed: &[usize]) -> String {
    match changed {
        [] => "No paragraphs changed".to_string(),
        [one] => format!("1 paragraph changed: {one}"),
        many => {
            let list: Vec<String> = many.iter().map(ToString::to_string).collect();
            format!("{} paragraphs changed: {}", many.len(), list.join(", "))
        }
    }
}

/// Imprime o resumo do job, como texto ou JSON.
pub fn print_summary(summary: &JobSummary, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(summary).unwrap_or_default()
        );
        return;
    }

    let label = Style::new().bold();
    let topic = if summary.topic.is_empty() {
        "(none)"
    } else {
        summary.topic.as_str()
    };
    println!("{}", green().apply_to("─── Assignment ───"));
    println!("  {} {}", label.apply_to("Job:     "), summary.job_id);
    println!("  {} {}", label.apply_to("Stage:   "), summary.stage);
    println!("  {} {topic}", label.apply_to("Topic:   "));
    if !summary.area.is_empty() {
        println!("  {} {}", label.apply_to("Area:    "), summary.area);
    }
    println!(
        "  {} {} / {} / {}",
        label.apply_to("Settings:"),
        summary.level,
        summary.length,
        summary.tone
    );
    println!(
        "  {} {} of {} ({} left)",
        label.apply_to("Revised: "),
        summary.revision_count.saturating_sub(1),
        summary.max_revisions,
        summary.revisions_remaining
    );
    if let Some(id) = &summary.plan_artifact {
        println!("  {} {id}", label.apply_to("Plan:    "));
    }
    if let Some(id) = &summary.draft_artifact {
        println!("  {} {id}", label.apply_to("Draft:   "));
    }
    let path: Vec<String> = summary
        .stage_transitions
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("  {} {}", label.apply_to("History: "), path.join(" → "));
}

pub fn print_artifacts(kind: ArtifactKind, ids: &[ArtifactId]) {
    if ids.is_empty() {
        println!("  {}", dim().apply_to(format!("no saved {kind}s")));
        return;
    }
    for (i, id) in ids.iter().enumerate() {
        println!("  {:>3}. {id}", i + 1);
    }
}

pub fn print_stats(stats: &TextStats, band: LengthBand, fit: LengthFit) {
    println!("{}", green().apply_to("─── Draft statistics ───"));
    println!("  Words:               {}", stats.words);
    println!("  Unique words:        {}", stats.unique_words);
    println!("  Sentences:           {}", stats.sentences);
    println!("  Avg sentence length: {:.1} words", stats.avg_sentence_words);
    println!("  Vocabulary richness: {:.2}", stats.vocabulary_richness);

    match fit {
        LengthFit::Within => success(&format!("Within the {band} target")),
        LengthFit::Under { missing } => {
            warning(&format!("{missing} words short of the {band} target"))
        }
        LengthFit::Over { excess } => warning(&format!("{excess} words over the {band} target")),
    }

    if !stats.top_terms.is_empty() {
        println!();
        println!("  {}", Style::new().bold().apply_to("Top terms"));
        for (term, count) in &stats.top_terms {
            println!("  {count:>5}  {term}");
        }
    }
}

pub fn print_models(models: &[ModelInfo], current: &str) {
    if models.is_empty() {
        println!("  {}", dim().apply_to("no models installed"));
        return;
    }
    for model in models {
        let marker = if model.name == current { "*" } else { " " };
        let size_gb = model.size as f64 / 1_000_000_000.0;
        let modified = model
            .modified_at
            .as_deref()
            .map(|at| at.get(..10).unwrap_or(at))
            .unwrap_or("");
        println!("  {marker} {:<28} {size_gb:>6.1} GB  {modified}", model.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_summary_lists_positions() {
        assert_eq!(changed_summary(&[]), "No paragraphs changed");
        assert_eq!(changed_summary(&[3]), "1 paragraph changed: 3");
        assert_eq!(changed_summary(&[1, 4]), "2 paragraphs changed: 1, 4");
    }
}
