//! Interface de linha de comando do draftsmith baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (um por ação do
//! workflow, mais listagem e consulta de artefatos) e flags globais
//! (--model, --temperature, --top-p, --max-revisions, --no-stream, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Overrides;
use crate::state_machine::{AcademicLevel, AssignmentParams, LengthBand, Tone};

/// draftsmith: planeja, redige, critica e revisa trabalhos de teologia com um modelo local.
#[derive(Debug, Parser)]
#[command(name = "draftsmith", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Modelo do Ollama a usar nesta sessão (ex.: llama3.3, gemma3:27b).
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Temperatura de amostragem, entre 0 e 1.
    #[arg(long, global = true)]
    pub temperature: Option<f64>,

    /// Nucleus sampling, entre 0 e 1.
    #[arg(long, global = true)]
    pub top_p: Option<f64>,

    /// Número máximo de revisões por assignment.
    #[arg(long, global = true)]
    pub max_revisions: Option<u32>,

    /// Espera a resposta completa em vez de exibi-la em fragmentos.
    #[arg(long, global = true, default_value_t = false)]
    pub no_stream: bool,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            model: self.model.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            max_revisions: self.max_revisions,
            no_stream: self.no_stream,
        }
    }
}

/// Nível acadêmico aceito pela CLI, mapeado para [`AcademicLevel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    #[default]
    Undergraduate,
    /// Mestrado.
    Graduate,
    Thesis,
}

impl From<LevelArg> for AcademicLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Undergraduate => AcademicLevel::Undergraduate,
            LevelArg::Graduate => AcademicLevel::Graduate,
            LevelArg::Thesis => AcademicLevel::Thesis,
        }
    }
}

/// Faixa de tamanho aceita pela CLI, mapeada para [`LengthBand`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LengthArg {
    #[value(name = "750-1000")]
    W750,
    #[default]
    #[value(name = "1500-2000")]
    W1500,
    #[value(name = "2500-3000")]
    W2500,
    #[value(name = "4000-5000")]
    W4000,
    #[value(name = "7000-8000")]
    W7000,
}

impl From<LengthArg> for LengthBand {
    fn from(arg: LengthArg) -> Self {
        match arg {
            LengthArg::W750 => LengthBand::Words750To1000,
            LengthArg::W1500 => LengthBand::Words1500To2000,
            LengthArg::W2500 => LengthBand::Words2500To3000,
            LengthArg::W4000 => LengthBand::Words4000To5000,
            LengthArg::W7000 => LengthBand::Words7000To8000,
        }
    }
}

/// Tom de linguagem aceito pela CLI, mapeado para [`Tone`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ToneArg {
    #[default]
    Academic,
    Analytical,
    Reflective,
    Critical,
    Expository,
}

impl From<ToneArg> for Tone {
    fn from(arg: ToneArg) -> Self {
        match arg {
            ToneArg::Academic => Tone::Academic,
            ToneArg::Analytical => Tone::Analytical,
            ToneArg::Reflective => Tone::Reflective,
            ToneArg::Critical => Tone::Critical,
            ToneArg::Expository => Tone::Expository,
        }
    }
}

/// Parâmetros de um assignment, compartilhados por `plan` e `resume`.
#[derive(Debug, Clone, clap::Args)]
pub struct ParamsArgs {
    /// Tema do assignment.
    #[arg(long)]
    pub topic: Option<String>,

    /// Área da teologia (ex.: "Systematic Theology").
    #[arg(long)]
    pub area: String,

    #[arg(long, value_enum, default_value_t)]
    pub level: LevelArg,

    #[arg(long, value_enum, default_value_t)]
    pub length: LengthArg,

    #[arg(long, value_enum, default_value_t)]
    pub tone: ToneArg,
}

impl ParamsArgs {
    pub fn to_params(&self) -> AssignmentParams {
        AssignmentParams {
            topic: self.topic.clone().unwrap_or_default(),
            area: self.area.clone(),
            level: self.level.into(),
            length: self.length.into(),
            tone: self.tone.into(),
        }
    }
}

/// O que `show` deve exibir do job corrente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowArg {
    Plan,
    Draft,
    Critique,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Gera o plano de um novo assignment.
    Plan {
        #[command(flatten)]
        params: ParamsArgs,
    },

    /// Substitui o plano pelo conteúdo de um arquivo (ou stdin).
    EditPlan {
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Gera um rascunho a partir do plano.
    Draft,

    /// Substitui o rascunho pelo conteúdo de um arquivo (ou stdin).
    EditDraft {
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Pede ao modelo uma crítica do rascunho atual.
    Critique,

    /// Revisa o rascunho para atender à crítica.
    Revise,

    /// Volta um estágio (rascunho → plano, crítica → rascunho).
    Back,

    /// Aceita o rascunho atual como versão final.
    Finalize,

    /// Descarta o job corrente; os artefatos salvos permanecem.
    Reset,

    /// Mostra o status atual do job.
    Status {
        /// Imprime o resumo como JSON.
        #[arg(long)]
        json: bool,
    },

    /// Lista os planos salvos, do mais recente ao mais antigo.
    Plans,

    /// Lista os rascunhos salvos, do mais recente ao mais antigo.
    Drafts,

    /// Carrega um plano (estágio PLAN) ou rascunho (estágio DRAFT) salvo.
    Load {
        /// Nome do arquivo do artefato, ex.: plan_Grace_20260101_120000.md
        id: String,
    },

    /// Inicia um novo job a partir de artefatos salvos.
    Resume {
        /// Plano de partida; o mais recente quando omitido.
        #[arg(long)]
        plan: Option<String>,

        #[arg(long)]
        draft: Option<String>,

        #[command(flatten)]
        params: ParamsArgs,
    },

    /// Exibe o texto atual do job, ou o corpo de um artefato salvo com --id.
    Show {
        #[arg(value_enum, required_unless_present = "id")]
        what: Option<ShowArg>,

        #[arg(long, conflicts_with = "what")]
        id: Option<String>,
    },

    /// Exporta o assignment final como texto.
    Export {
        /// Diretório de destino.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Estatísticas do rascunho atual.
    Stats {
        /// Quantidade de termos mais frequentes.
        #[arg(long, default_value_t = crate::stats::DEFAULT_TOP_TERMS)]
        top: usize,
    },

    /// Lista os modelos instalados no servidor Ollama.
    Models,
}

impl Command {
    /// Comandos que alteram o job e exigem salvar a sessão.
    pub fn mutates_job(&self) -> bool {
        !matches!(
            self,
            Command::Status { .. }
                | Command::Plans
                | Command::Drafts
                | Command::Show { .. }
                | Command::Export { .. }
                | Command::Stats { .. }
                | Command::Models
        )
    }
}
