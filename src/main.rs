//! # sgq-pdf CLI
//!
//! Usage:
//!   sgq-pdf record.json -o record.pdf
//!   cat record.json | sgq-pdf -o record.pdf --config layout.json
//!   sgq-pdf --example > record.json
//!
//! Set `RUST_LOG=sgq_pdf=debug` to trace pagination.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::Parser;
use sgq_pdf::config::LayoutConfig;
use sgq_pdf::model::ProcedureDocument;
use sgq_pdf::SgqPdfError;

#[derive(Parser, Debug)]
#[command(version, about = "Render quality procedure records to PDF", long_about = None)]
struct Args {
    /// Document JSON; read from stdin when omitted
    input: Option<PathBuf>,

    /// Where to write the PDF
    #[arg(short, long, default_value = "output.pdf")]
    output: PathBuf,

    /// Layout configuration JSON, replacing the document's own
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a sample document and exit
    #[arg(long, default_value_t = false)]
    example: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if args.example {
        print!("{}", example_document_json());
        return;
    }

    match run(&args) {
        Ok(len) => eprintln!("✓ Written {} bytes to {}", len, args.output.display()),
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<usize, SgqPdfError> {
    let input = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut document: ProcedureDocument = serde_json::from_str(&input)?;
    if let Some(path) = &args.config {
        let config: LayoutConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
        log::info!("Using layout configuration from {}", path.display());
        document.config = config;
    }

    let pdf = sgq_pdf::render(&document)?;
    fs::write(&args.output, &pdf)?;
    Ok(pdf.len())
}

fn example_document_json() -> &'static str {
    r##"{
  "title": "P-04 Gestão de Compras",
  "filePath": "Qualidade/Processos/P-04 Gestão de Compras.pdf",
  "template": {
    "type": "process",
    "donoProcesso": "Diretor Administrativo",
    "objetivoProcesso": "Assegurar que os produtos e serviços adquiridos cumprem os requisitos especificados.",
    "servicosEntrada": "Todos os departamentos",
    "servicoSaida": "Armazém, Produção",
    "activities": [
      ["A1", "Identificar a necessidade de compra", "Requisitante", "Necessidade", "Pedido de compra", "[FORM] Pedido de Compra||https://forms.example.pt/pc"],
      ["A2", "Consultar fornecedores aprovados", "Compras", "Pedido de compra", "Propostas", "Lista de fornecedores"],
      ["A3", "Selecionar proposta e emitir encomenda", "", "Propostas", "Nota de encomenda", "[VIDEO] Como emitir uma encomenda||https://videos.example.pt/encomendas"],
      ["A4", "Rececionar e verificar o material", "Armazém", "Guia de remessa", "Material aceite", "Registo de receção"]
    ],
    "merge": {
      "mergedSpans": { "1-2": 2 },
      "hiddenCells": { "2-2": true }
    },
    "indicadores": [
      "Prazo médio de entrega",
      "Percentagem de não conformidades na receção"
    ]
  },
  "history": [
    {
      "data": "2024-02-12T09:30:00Z",
      "utilizador": "ana.silva",
      "acao": "Criação",
      "descricao": "Documento criado"
    },
    {
      "data": "2024-06-03T15:04:00Z",
      "utilizador": "bruno.costa",
      "acao": "Alteração",
      "descricao": "Dono do Processo: de \"Diretora Financeira\" para \"Diretor Administrativo\""
    }
  ]
}
"##
}
