//! Interface de linha de comando do moviematch baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (swipe, connect, matches,
//! status) e flags globais (--config, --base-url, --low-water-mark,
//! --max-retries, --verbose).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// moviematch — escolha filmes com seu par, um cartão de cada vez.
#[derive(Debug, Parser)]
#[command(name = "moviematch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração (padrão: ./moviematch.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Endereço do servidor, sobrescreve o arquivo.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Filmes pré-carregados abaixo dos quais a reposição começa.
    #[arg(long, global = true)]
    pub low_water_mark: Option<usize>,

    /// Número máximo de tentativas de busca de filme.
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inicia uma sessão interativa de escolha de filmes.
    Swipe,

    /// Conecta-se a um parceiro pelo id de usuário.
    Connect {
        /// Id numérico do parceiro.
        user_id: String,
    },

    /// Recalcula e lista os matches com o parceiro atual.
    Matches,

    /// Mostra a configuração efetiva e o parceiro conectado.
    Status,
}
