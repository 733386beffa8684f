//! Interface de terminal do moviematch: spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de status e `console` para
//! estilização com cores. O [`TerminalPresenter`] implementa o
//! [`Presenter`] da sessão e desenha cada filme como um cartão no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::{Candidate, Presenter, Verdict};
use crate::error::ErrorKind;
use crate::pairing::{MatchEntry, PartnerConnection};

/// Teclas aceitas durante a sessão.
pub const KEY_HINT: &str = "[l] like  [d] dislike  [r] recommend  [p] pause prefetch  [q] quit";

const RETRY_HINT: &str = "[t] try again  [q] quit";

// Sinopses longas são cortadas para caber no cartão.
const OVERVIEW_LIMIT: usize = 280;

/// Apresentador de terminal da sessão de filmes.
///
/// A linha do spinner funciona como barra de status; cartões, confirmações e
/// erros são impressos acima dela.
pub struct TerminalPresenter {
    // Spinner do indicatif usado como linha de status.
    pb: ProgressBar,
    title: Style,
    dim: Style,
    green: Style,
    red: Style,
    yellow: Style,
}

impl TerminalPresenter {
    /// Inicia o spinner com a mensagem de carregamento.
    pub fn start() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Loading movies...");
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            title: Style::new().bold().cyan(),
            dim: Style::new().dim(),
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Mostra o estado da pré-carga na linha de status.
    pub fn paused(&self, paused: bool) {
        let note = if paused {
            "prefetch paused"
        } else {
            "prefetch resumed"
        };
        self.pb
            .println(format!("  {} {note}", self.yellow.apply_to("⏸")));
    }

    /// Encerra o spinner e limpa a linha de status.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl Presenter for TerminalPresenter {
    fn on_candidate_ready(&self, candidate: &Candidate) {
        self.pb.println("");
        for (i, line) in card_lines(candidate).into_iter().enumerate() {
            let line = if i == 0 {
                self.title.apply_to(line).to_string()
            } else {
                line
            };
            self.pb.println(format!("  {line}"));
        }
        self.pb.set_message(self.dim.apply_to(KEY_HINT).to_string());
    }

    fn on_submitting(&self) {
        self.pb.set_message("Saving your choice...");
    }

    fn on_advance_blocked(&self, kind: ErrorKind) {
        self.pb
            .println(format!("  {} {kind}", self.red.apply_to("✗")));
        self.pb.set_message(RETRY_HINT);
    }

    fn on_match_list_ready(&self, matches: &[MatchEntry]) {
        for line in match_lines(matches) {
            self.pb.println(format!("  {line}"));
        }
    }

    fn on_decision_recorded(&self, candidate: &Candidate, verdict: Verdict) {
        self.pb.println(format!(
            "  {} You {} \"{}\"",
            self.green.apply_to("✓"),
            verdict.past_tense(),
            candidate.title
        ));
    }
}

/// Linhas do cartão de um filme, sem estilo. A primeira é o título.
pub fn card_lines(candidate: &Candidate) -> Vec<String> {
    let mut lines = Vec::new();
    match candidate.release_year {
        Some(year) => lines.push(format!("{} ({year})", candidate.title)),
        None => lines.push(candidate.title.clone()),
    }
    lines.push(format!("Rating: {}", candidate.rating_label()));
    if candidate.details_pending {
        lines.push("Genres: details pending".to_string());
    } else {
        lines.push(format!("Genres: {}", candidate.genres.join(", ")));
    }
    if !candidate.overview.is_empty() {
        lines.push(shorten(&candidate.overview, OVERVIEW_LIMIT));
    }
    lines.push(format!("Poster: {}", candidate.poster_url));
    if let Some(trailer) = &candidate.trailer_url {
        lines.push(format!("Trailer: {trailer}"));
    }
    lines
}

/// Linhas da lista de matches.
pub fn match_lines(matches: &[MatchEntry]) -> Vec<String> {
    if matches.is_empty() {
        return vec!["No matches yet. Keep swiping!".to_string()];
    }
    let mut lines = vec![format!("{} match(es):", matches.len())];
    lines.extend(
        matches
            .iter()
            .map(|m| match &m.title {
                Some(title) => format!("{title} (movie {}) with {}", m.candidate_id, m.partner_display_name),
                None => format!("movie {} with {}", m.candidate_id, m.partner_display_name),
            }),
    );
    lines
}

/// Imprime o parceiro atual, fora de uma sessão interativa.
pub fn print_partner(partner: Option<&PartnerConnection>) {
    match partner {
        Some(p) => println!(
            "  {} Connected to {} (id {})",
            Style::new().green().bold().apply_to("✓"),
            p.partner_display_name,
            p.partner_id
        ),
        None => println!(
            "  {} No partner connected. Use `moviematch connect <USER_ID>`.",
            Style::new().yellow().apply_to("•")
        ),
    }
}

/// Imprime uma falha fora de uma sessão interativa.
pub fn print_failure(message: &str) {
    println!("  {} {message}", Style::new().red().bold().apply_to("✗"));
}

fn shorten(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}
