//! Contract Checklist (Lista de Chequeo)
//!
//! A catalog of yes/no/n-a questions grouped by contract stage, answered once
//! per contract. Compliance is the share of "Si" among applicable answers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use super::entity::{DomainError, Entity};

/// Contract stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Etapa {
    Precontractual,
    Contractual,
    Postcontractual,
}

impl Etapa {
    pub const ALL: [Etapa; 3] = [Etapa::Precontractual, Etapa::Contractual, Etapa::Postcontractual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Etapa::Precontractual => "precontractual",
            Etapa::Contractual => "contractual",
            Etapa::Postcontractual => "postcontractual",
        }
    }
}

impl FromStr for Etapa {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "precontractual" => Ok(Etapa::Precontractual),
            "contractual" => Ok(Etapa::Contractual),
            "postcontractual" | "poscontractual" => Ok(Etapa::Postcontractual),
            _ => Err(DomainError::Validation(format!("unknown etapa: {}", s))),
        }
    }
}

/// Answer to one checklist question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Respuesta {
    Si,
    No,
    NoAplica,
}

impl Respuesta {
    pub fn as_str(&self) -> &'static str {
        match self {
            Respuesta::Si => "si",
            Respuesta::No => "no",
            Respuesta::NoAplica => "na",
        }
    }
}

impl FromStr for Respuesta {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "si" | "sí" => Ok(Respuesta::Si),
            "no" => Ok(Respuesta::No),
            "na" | "n/a" | "no aplica" => Ok(Respuesta::NoAplica),
            _ => Err(DomainError::Validation(format!("unknown respuesta: {}", s))),
        }
    }
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub etapa: Etapa,
    pub numero: i32,
    pub descripcion: String,
}

impl Entity for ChecklistItem {
    type Id = Uuid;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Answer recorded for a contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistAnswer {
    pub id: Uuid,
    /// Contract number, e.g. "SE-CD-045-2025"
    pub contrato: String,
    pub item_id: Uuid,
    pub respuesta: Respuesta,
    #[serde(default)]
    pub observacion: String,
}

impl Entity for ChecklistAnswer {
    type Id = Uuid;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Tally for one stage (or the whole checklist)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct StageCompliance {
    pub si: u32,
    pub no: u32,
    pub no_aplica: u32,
    pub pendientes: u32,
}

impl StageCompliance {
    fn record(&mut self, answer: Option<Respuesta>) {
        match answer {
            Some(Respuesta::Si) => self.si += 1,
            Some(Respuesta::No) => self.no += 1,
            Some(Respuesta::NoAplica) => self.no_aplica += 1,
            None => self.pendientes += 1,
        }
    }

    fn merge(&mut self, other: &StageCompliance) {
        self.si += other.si;
        self.no += other.no;
        self.no_aplica += other.no_aplica;
        self.pendientes += other.pendientes;
    }

    /// Percentage of "Si" among Si + No. Nothing applicable counts as fully compliant.
    pub fn porcentaje(&self) -> f64 {
        let applicable = self.si + self.no;
        if applicable == 0 {
            100.0
        } else {
            f64::from(self.si) * 100.0 / f64::from(applicable)
        }
    }
}

/// Compliance of one contract against the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub contrato: String,
    pub por_etapa: Vec<(Etapa, StageCompliance)>,
    pub general: StageCompliance,
}

impl ComplianceReport {
    /// Answers for items missing from the catalog are ignored
    pub fn compute(contrato: &str, catalog: &[ChecklistItem], answers: &[ChecklistAnswer]) -> Self {
        let by_item: HashMap<Uuid, Respuesta> = answers
            .iter()
            .filter(|a| a.contrato == contrato)
            .map(|a| (a.item_id, a.respuesta))
            .collect();

        let mut por_etapa: Vec<(Etapa, StageCompliance)> = Etapa::ALL
            .iter()
            .map(|e| (*e, StageCompliance::default()))
            .collect();

        for item in catalog {
            if let Some((_, tally)) = por_etapa.iter_mut().find(|(e, _)| *e == item.etapa) {
                tally.record(by_item.get(&item.id).copied());
            }
        }

        let mut general = StageCompliance::default();
        for (_, tally) in &por_etapa {
            general.merge(tally);
        }

        Self {
            contrato: contrato.to_string(),
            por_etapa,
            general,
        }
    }

    pub fn etapa(&self, etapa: Etapa) -> StageCompliance {
        self.por_etapa
            .iter()
            .find(|(e, _)| *e == etapa)
            .map(|(_, t)| *t)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(n: u128, etapa: Etapa) -> ChecklistItem {
        ChecklistItem {
            id: Uuid::from_u128(n),
            etapa,
            numero: n as i32,
            descripcion: format!("Pregunta {}", n),
        }
    }

    fn answer(item: u128, respuesta: Respuesta) -> ChecklistAnswer {
        ChecklistAnswer {
            id: Uuid::new_v4(),
            contrato: "SE-001".into(),
            item_id: Uuid::from_u128(item),
            respuesta,
            observacion: String::new(),
        }
    }

    #[test]
    fn test_compliance_by_stage() {
        let catalog = vec![
            item(1, Etapa::Precontractual),
            item(2, Etapa::Precontractual),
            item(3, Etapa::Precontractual),
            item(4, Etapa::Contractual),
            item(5, Etapa::Contractual),
            item(6, Etapa::Postcontractual),
        ];
        let answers = vec![
            answer(1, Respuesta::Si),
            answer(2, Respuesta::No),
            answer(3, Respuesta::NoAplica),
            answer(4, Respuesta::Si),
            answer(99, Respuesta::No),
        ];

        let report = ComplianceReport::compute("SE-001", &catalog, &answers);

        let pre = report.etapa(Etapa::Precontractual);
        assert_eq!((pre.si, pre.no, pre.no_aplica, pre.pendientes), (1, 1, 1, 0));
        assert_eq!(pre.porcentaje(), 50.0);

        let con = report.etapa(Etapa::Contractual);
        assert_eq!(con.pendientes, 1);
        assert_eq!(con.porcentaje(), 100.0);

        assert_eq!(report.etapa(Etapa::Postcontractual).pendientes, 1);
        assert_eq!(report.general.si, 2);
        assert_eq!(report.general.no, 1);
        assert!((report.general.porcentaje() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_other_contract_answers_ignored() {
        let catalog = vec![item(1, Etapa::Contractual)];
        let mut other = answer(1, Respuesta::No);
        other.contrato = "SE-002".into();

        let report = ComplianceReport::compute("SE-001", &catalog, &[other]);
        assert_eq!(report.general.pendientes, 1);
    }

    #[test]
    fn test_parse_answers() {
        assert_eq!("Sí".parse::<Respuesta>().unwrap(), Respuesta::Si);
        assert_eq!("N/A".parse::<Respuesta>().unwrap(), Respuesta::NoAplica);
        assert_eq!("poscontractual".parse::<Etapa>().unwrap(), Etapa::Postcontractual);
        assert!("tal vez".parse::<Respuesta>().is_err());
    }
}
