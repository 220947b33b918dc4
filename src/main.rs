use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

mod activity;
mod aggregate;
mod alerts;
mod export;
mod filters;
mod format;
mod ingest;
mod models;
mod normalize;
mod rank;
mod report;

use aggregate::TimeBucket;
use filters::FilterParams;
use models::{Category, LabStatus, RepMetrics};

#[derive(Parser)]
#[command(name = "toxrep-dashboard")]
#[command(about = "Commercial dashboard pipeline for lab collection representatives", long_about = None)]
struct Cli {
    /// Directory holding representatives.csv, laboratories.csv and
    /// gatherings.csv.
    #[arg(long, env = "TOX_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RepType {
    All,
    Internal,
    External,
}

impl RepType {
    fn category(self) -> Option<Category> {
        match self {
            RepType::All => None,
            RepType::Internal => Some(Category::Internal),
            RepType::External => Some(Category::External),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RankMetric {
    Collections,
    ActivationRate,
    Productivity,
    ActiveLabs,
    CredentialedLabs,
}

impl RankMetric {
    fn value(self, metrics: &RepMetrics) -> f64 {
        match self {
            RankMetric::Collections => metrics.total_collections as f64,
            RankMetric::ActivationRate => metrics.activation_rate,
            RankMetric::Productivity => metrics.productivity,
            RankMetric::ActiveLabs => metrics.active_labs as f64,
            RankMetric::CredentialedLabs => metrics.credentialed_labs as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Bucket {
    Month,
    Week,
}

#[derive(Debug, Clone, Args)]
struct FilterArgs {
    /// Collection year shown on the dashboard.
    #[arg(long, env = "DEFAULT_YEAR", default_value_t = 2025)]
    year: i32,
    /// Days without collecting before a lab stops counting as active.
    #[arg(
        long,
        env = "DEFAULT_ACTIVITY_WINDOW_DAYS",
        default_value_t = 15,
        value_parser = clap::value_parser!(i64).range(7..=60)
    )]
    window: i64,
    #[arg(long, value_enum, default_value = "all")]
    rep_type: RepType,
    /// Restrict to specific representatives (clean names, repeatable).
    #[arg(long = "rep")]
    reps: Vec<String>,
    /// Lab name or CNPJ substring.
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    fn params(&self) -> FilterParams {
        FilterParams {
            year: self.year,
            activity_window_days: self.window,
            category: self.rep_type.category(),
            representatives: self.reps.clone(),
            search: self.search.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Consolidated monthly KPIs and lab activity counters
    Kpis {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Rank representatives by a performance metric
    RankReps {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value = "collections")]
        metric: RankMetric,
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Also export the full ranking as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Rank laboratories by collection volume
    RankLabs {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Weekly or monthly volume series per category
    Trends {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value = "month")]
        bucket: Bucket,
        #[arg(long)]
        json: bool,
    },
    /// Inactive laboratories grouped by representative
    Alerts {
        #[command(flatten)]
        filter: FilterArgs,
        /// Days without collecting before a lab enters the alert report.
        #[arg(
            long,
            default_value_t = 30,
            value_parser = clap::value_parser!(i64).range(15..=90)
        )]
        threshold: i64,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Laboratories credentialed in the recent lookback
    Accreditations {
        #[command(flatten)]
        filter: FilterArgs,
        /// Lookback in months (30-day months).
        #[arg(
            long,
            default_value_t = 3,
            value_parser = clap::value_parser!(u32).range(1..=12)
        )]
        months: u32,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Full markdown management report
    Report {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(
            long,
            default_value_t = 30,
            value_parser = clap::value_parser!(i64).range(15..=90)
        )]
        threshold: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

struct Pipeline {
    snapshot: filters::Snapshot,
    /// Classified against the selected year's records.
    statuses: Vec<LabStatus>,
    /// Classified against the all-years history, for the alerts page.
    history_statuses: Vec<LabStatus>,
}

fn run_pipeline(dataset: &models::Dataset, filter: &FilterArgs, now: NaiveDate) -> Pipeline {
    let params = filter.params();
    let snapshot = filters::apply(dataset, &params);
    let statuses = activity::classify(
        &snapshot.labs,
        &snapshot.records,
        now,
        params.activity_window_days,
    );
    let history_statuses = activity::classify(
        &snapshot.labs,
        &snapshot.history,
        now,
        params.activity_window_days,
    );
    Pipeline {
        snapshot,
        statuses,
        history_statuses,
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let excluded_lab_id = std::env::var("EXCLUDED_LAB_ID")
        .unwrap_or_else(|_| ingest::DEFAULT_EXCLUDED_LAB_ID.to_string());
    let dataset = ingest::load_dataset(&cli.data_dir, &excluded_lab_id)?;
    let now = chrono::Local::now().date_naive();

    match cli.command {
        Commands::Kpis { filter, json } => {
            let pipeline = run_pipeline(&dataset, &filter, now);
            let monthly = aggregate::volume_series(&pipeline.snapshot.records, TimeBucket::Month);
            let kpis = aggregate::monthly_kpis(&monthly);

            let credentialed = pipeline
                .statuses
                .iter()
                .filter(|s| s.lab.credentialed)
                .count();
            let active = pipeline
                .statuses
                .iter()
                .filter(|s| s.lab.credentialed && s.active)
                .count();

            if json {
                let payload = serde_json::json!({
                    "kpis": kpis,
                    "credentialed_labs": credentialed,
                    "active_labs": active,
                    "inactive_labs": credentialed - active,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("KPIs de {} (janela de {} dias):", filter.year, filter.window);
                println!("- Total de coletas: {}", format::thousands_br(kpis.total));
                println!("- Melhor mês: {}", format::thousands_br(kpis.max_month));
                println!("- Pior mês: {}", format::thousands_br(kpis.min_month));
                println!("- Média mensal: {}", format::thousands_br(kpis.avg_month));
                println!("- Labs credenciados: {}", format::thousands_br(credentialed));
                println!("- Labs ativos: {}", format::thousands_br(active));
                println!(
                    "- Labs inativos: {}",
                    format::thousands_br(credentialed - active)
                );
            }
        }
        Commands::RankReps {
            filter,
            metric,
            top,
            csv,
        } => {
            let pipeline = run_pipeline(&dataset, &filter, now);
            let metrics = aggregate::representative_metrics(
                &pipeline.snapshot.representatives,
                &pipeline.statuses,
                &pipeline.snapshot.records,
            );
            let ranked = rank::rank_by(&metrics, |m| metric.value(m), |m| m.name.as_str());

            if ranked.is_empty() {
                println!("Nenhum representante para os filtros atuais.");
            } else {
                println!("Top representantes:");
                for m in rank::top(&ranked, top) {
                    println!(
                        "- {} ({}): {} coletas, {} de {} labs ativos (taxa {}), produtividade {}",
                        m.name,
                        m.category,
                        format::thousands_br(m.total_collections),
                        format::thousands_br(m.active_labs),
                        format::thousands_br(m.credentialed_labs),
                        format::percent_br(m.activation_rate),
                        format::decimal_br(m.productivity, 1)
                    );
                }
            }

            if let Some(path) = csv {
                export::write_representative_ranking(&path, &ranked)?;
                println!("Ranking exportado para {}.", path.display());
            }
        }
        Commands::RankLabs { filter, top, csv } => {
            let pipeline = run_pipeline(&dataset, &filter, now);
            let volumes = aggregate::lab_volumes(&pipeline.statuses, &pipeline.snapshot.records);
            let ranked = rank::rank_by(&volumes, |v| v.collections as f64, |v| v.name.as_str());

            if ranked.is_empty() {
                println!("Nenhum laboratório com coletas para os filtros atuais.");
            } else {
                println!("Top laboratórios por volume:");
                for v in rank::top(&ranked, top) {
                    println!(
                        "- {} (CNPJ {}): {} coletas, última em {} [{}] - {}",
                        v.name,
                        format::cnpj_br(&v.cnpj),
                        format::thousands_br(v.collections),
                        format::datetime_br(v.last_collection.as_ref()),
                        format::status_label(v.active, v.last_collection.is_some()),
                        v.representative
                    );
                }
            }

            if let Some(path) = csv {
                export::write_lab_ranking(&path, &ranked)?;
                println!("Ranking exportado para {}.", path.display());
            }
        }
        Commands::Trends {
            filter,
            bucket,
            json,
        } => {
            let pipeline = run_pipeline(&dataset, &filter, now);
            let bucket = match bucket {
                Bucket::Month => TimeBucket::Month,
                Bucket::Week => TimeBucket::Week,
            };
            let series = aggregate::volume_series(&pipeline.snapshot.records, bucket);

            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else if series.is_empty() {
                println!("Nenhuma coleta para os filtros atuais.");
            } else {
                for point in &series {
                    println!(
                        "{}  {}  {}",
                        point.bucket,
                        point.category,
                        format::thousands_br(point.collections)
                    );
                }
            }
        }
        Commands::Alerts {
            filter,
            threshold,
            csv,
        } => {
            let pipeline = run_pipeline(&dataset, &filter, now);
            let groups = alerts::build_alerts(&pipeline.history_statuses, threshold);

            if groups.is_empty() {
                println!("Nenhum laboratório sem coleta há mais de {threshold} dias.");
            } else {
                let stats = alerts::alert_stats(&groups);
                println!(
                    "{} laboratórios sem coleta há mais de {} dias (média {} dias, máximo {} dias):",
                    format::thousands_br(stats.labs),
                    threshold,
                    format::decimal_br(stats.avg_days, 0),
                    stats.max_days
                );
                for group in &groups {
                    println!(
                        "- {} ({}): {} labs",
                        group.representative,
                        group.category,
                        group.labs.len()
                    );
                    for lab in &group.labs {
                        println!(
                            "    {} (CNPJ {}): última coleta {}, {} dias",
                            lab.name,
                            format::cnpj_br(&lab.cnpj),
                            format::datetime_br(lab.last_collection.as_ref()),
                            format::days_label(lab.days_since)
                        );
                    }
                }
            }

            if let Some(path) = csv {
                export::write_alerts(&path, &groups)?;
                println!("Alertas exportados para {}.", path.display());
            }
        }
        Commands::Accreditations {
            filter,
            months,
            csv,
        } => {
            let pipeline = run_pipeline(&dataset, &filter, now);
            let accreditations =
                aggregate::new_accreditations(&pipeline.snapshot.labs, now, months);

            if accreditations.is_empty() {
                println!("Nenhum laboratório credenciado nos últimos {months} meses.");
            } else {
                println!(
                    "{} laboratórios credenciados nos últimos {} meses:",
                    format::thousands_br(accreditations.len()),
                    months
                );
                for acc in &accreditations {
                    println!(
                        "- {} (CNPJ {}): credenciado em {}, há {} dias - {} ({})",
                        acc.name,
                        format::cnpj_br(&acc.cnpj),
                        format::datetime_br(Some(&acc.accredited_at)),
                        format::thousands_br(acc.days_accredited as usize),
                        acc.representative,
                        acc.category
                    );
                }
            }

            if let Some(path) = csv {
                export::write_accreditations(&path, &accreditations)?;
                println!("Credenciamentos exportados para {}.", path.display());
            }
        }
        Commands::Report {
            filter,
            threshold,
            out,
        } => {
            let pipeline = run_pipeline(&dataset, &filter, now);
            let monthly = aggregate::volume_series(&pipeline.snapshot.records, TimeBucket::Month);
            let kpis = aggregate::monthly_kpis(&monthly);
            let categories =
                aggregate::category_summary(&pipeline.statuses, &pipeline.snapshot.records);
            let metrics = aggregate::representative_metrics(
                &pipeline.snapshot.representatives,
                &pipeline.statuses,
                &pipeline.snapshot.records,
            );
            let ranked =
                rank::rank_by(&metrics, |m| m.total_collections as f64, |m| m.name.as_str());
            let groups = alerts::build_alerts(&pipeline.history_statuses, threshold);

            let report = report::build_report(
                filter.year,
                filter.window,
                threshold,
                now,
                &kpis,
                &categories,
                &ranked,
                &groups,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Relatório gravado em {}.", out.display());
        }
    }

    Ok(())
}
