use std::fmt::Write;

use chrono::NaiveDate;

use crate::alerts;
use crate::format;
use crate::models::{AlertGroup, CategorySummary, RepMetrics, VolumeKpis};

/// Markdown management report: KPIs, category summary, top
/// representatives, follow-up alerts.
pub fn build_report(
    year: i32,
    window_days: i64,
    threshold_days: i64,
    now: NaiveDate,
    kpis: &VolumeKpis,
    categories: &[CategorySummary],
    ranked_reps: &[RepMetrics],
    alert_groups: &[AlertGroup],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Relatório de Gestão Comercial - {year}");
    let _ = writeln!(
        output,
        "Gerado em {} (janela de atividade: {window_days} dias, alerta: {threshold_days} dias)",
        now.format("%d/%m/%Y")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Indicadores Mensais");

    if kpis.total == 0 {
        let _ = writeln!(output, "Nenhuma coleta registrada para os filtros atuais.");
    } else {
        let _ = writeln!(output, "- Total de coletas: {}", format::thousands_br(kpis.total));
        let _ = writeln!(output, "- Melhor mês: {}", format::thousands_br(kpis.max_month));
        let _ = writeln!(output, "- Pior mês: {}", format::thousands_br(kpis.min_month));
        let _ = writeln!(output, "- Média mensal: {}", format::thousands_br(kpis.avg_month));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Resumo por Categoria");
    for summary in categories {
        let _ = writeln!(
            output,
            "- {}: {} labs credenciados, {} ativos ({}), {} coletas, produtividade {}",
            summary.category,
            format::thousands_br(summary.credentialed_labs),
            format::thousands_br(summary.active_labs),
            format::percent_br(summary.activation_rate),
            format::thousands_br(summary.total_collections),
            format::decimal_br(summary.productivity, 1)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Melhores Representantes");

    if ranked_reps.is_empty() {
        let _ = writeln!(output, "Nenhum representante para os filtros atuais.");
    } else {
        for metrics in ranked_reps.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}): {} coletas, {} de {} labs ativos (taxa {})",
                metrics.name,
                metrics.category,
                format::thousands_br(metrics.total_collections),
                format::thousands_br(metrics.active_labs),
                format::thousands_br(metrics.credentialed_labs),
                format::percent_br(metrics.activation_rate)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "## Alertas - Labs sem coleta há mais de {threshold_days} dias"
    );

    if alert_groups.is_empty() {
        let _ = writeln!(output, "Nenhum laboratório inativo. Bom trabalho.");
    } else {
        let stats = alerts::alert_stats(alert_groups);
        let _ = writeln!(
            output,
            "{} laboratórios inativos (média {} dias, máximo {} dias).",
            format::thousands_br(stats.labs),
            format::decimal_br(stats.avg_days, 0),
            format::thousands_br(stats.max_days.max(0) as usize)
        );
        let _ = writeln!(output);
        for group in alert_groups {
            let _ = writeln!(
                output,
                "### {} ({}) - {} labs",
                group.representative,
                group.category,
                group.labs.len()
            );
            for lab in &group.labs {
                let _ = writeln!(
                    output,
                    "- {} (CNPJ {}): última coleta {}, {} dias sem coletar",
                    lab.name,
                    format::cnpj_br(&lab.cnpj),
                    format::datetime_br(lab.last_collection.as_ref()),
                    format::days_label(lab.days_since)
                );
            }
        }
    }

    output
}
