use std::path::Path;

use anyhow::Context;

use crate::format;
use crate::models::{AlertGroup, LabVolume, NewAccreditation, RepMetrics};

/// Ranking of representatives, headers in the operator's language,
/// values formatted only here, at the point of export.
pub fn write_representative_ranking(path: &Path, metrics: &[RepMetrics]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record([
        "Representante",
        "Tipo",
        "Labs Credenciados",
        "Labs Ativos",
        "Labs Inativos",
        "Total de Coletas",
        "Taxa de Ativação",
        "Produtividade",
    ])?;

    for m in metrics {
        writer.write_record([
            m.name.clone(),
            m.category.label().to_string(),
            format::thousands_br(m.credentialed_labs),
            format::thousands_br(m.active_labs),
            format::thousands_br(m.inactive_labs),
            format::thousands_br(m.total_collections),
            format::percent_br(m.activation_rate),
            format::decimal_br(m.productivity, 1),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_lab_ranking(path: &Path, volumes: &[LabVolume]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record([
        "Laboratório",
        "CNPJ",
        "Representante",
        "Tipo",
        "Coletas",
        "Última Coleta",
        "Status",
    ])?;

    for v in volumes {
        writer.write_record([
            v.name.clone(),
            format::cnpj_br(&v.cnpj),
            v.representative.clone(),
            v.category.label().to_string(),
            format::thousands_br(v.collections),
            format::datetime_br(v.last_collection.as_ref()),
            format::status_label(v.active, v.last_collection.is_some()).to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Alert groups flattened to one row per inactive lab, the follow-up
/// report handed to the collection team.
pub fn write_alerts(path: &Path, groups: &[AlertGroup]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record([
        "Representante",
        "Tipo",
        "Laboratório",
        "CNPJ",
        "Última Coleta",
        "Dias sem Coletar",
    ])?;

    for group in groups {
        for lab in &group.labs {
            writer.write_record([
                group.representative.clone(),
                group.category.label().to_string(),
                lab.name.clone(),
                format::cnpj_br(&lab.cnpj),
                format::datetime_br(lab.last_collection.as_ref()),
                format::days_label(lab.days_since),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}

pub fn write_accreditations(path: &Path, accreditations: &[NewAccreditation]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record([
        "Laboratório",
        "CNPJ",
        "Representante",
        "Tipo",
        "Data de Credenciamento",
        "Dias Credenciado",
    ])?;

    for acc in accreditations {
        writer.write_record([
            acc.name.clone(),
            format::cnpj_br(&acc.cnpj),
            acc.representative.clone(),
            acc.category.label().to_string(),
            format::datetime_br(Some(&acc.accredited_at)),
            format::thousands_br(acc.days_accredited as usize),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, InactiveLab};

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("toxrep-{}-{name}", std::process::id()));
        path
    }

    #[test]
    fn representative_ranking_is_formatted_at_export() {
        let metrics = vec![RepMetrics {
            name: "JOAO SILVA".to_string(),
            category: Category::Internal,
            credentialed_labs: 1200,
            active_labs: 1000,
            inactive_labs: 200,
            total_collections: 2500,
            activation_rate: 0.8333,
            productivity: 2.5,
        }];
        let path = temp_path("reps.csv");
        write_representative_ranking(&path, &metrics).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(written.starts_with("Representante,Tipo"));
        assert!(written.contains("1.200"));
        assert!(written.contains("83,3%"));
        assert!(written.contains("2,5"));
    }

    #[test]
    fn alerts_flatten_one_row_per_lab() {
        let groups = vec![AlertGroup {
            representative: "JOAO SILVA".to_string(),
            category: Category::Internal,
            labs: vec![
                InactiveLab {
                    lab_id: "l1".to_string(),
                    name: "Lab Alfa".to_string(),
                    cnpj: "00111222000133".to_string(),
                    last_collection: None,
                    days_since: None,
                },
                InactiveLab {
                    lab_id: "l2".to_string(),
                    name: "Lab Beta".to_string(),
                    cnpj: String::new(),
                    last_collection: None,
                    days_since: Some(45),
                },
            ],
        }];
        let path = temp_path("alerts.csv");
        write_alerts(&path, &groups).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(written.lines().count(), 3);
        assert!(written.contains("00.111.222/0001-33"));
        assert!(written.contains("Sem coletas"));
        assert!(written.contains("45"));
    }
}
