//! services/validation_service.rs
//! Reglas FEBRABAN: dígitos verificadores de línea digitable y código de
//! barras, CNPJ, valor, vencimiento y banco emisor.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{
    boleto_model::BoletoData,
    validation_model::{FieldCheck, ValidationIssue, ValidationReport},
};

/// Códigos de banco aceptados como emisores
pub const KNOWN_BANK_CODES: [&str; 14] = [
    "001", "033", "104", "237", "341", "748", "756", "077", "260", "290", "403", "422", "140",
    "197",
];

pub const MAX_AMOUNT: f64 = 9_999_999.99;
const MAX_PAST_DAYS: i64 = 5 * 365;
const MAX_FUTURE_DAYS: i64 = 2 * 365;

pub fn validate_boleto(data: &BoletoData, today: NaiveDate) -> ValidationReport {
    let mut errors = Vec::new();
    let mut details = BTreeMap::new();

    let mut record = |key: &'static str, check: FieldCheck, errors: &mut Vec<ValidationIssue>| {
        errors.extend(check.errors.iter().cloned());
        details.insert(key, check);
    };

    match &data.digitable_line {
        Some(line) => record("linha_digitavel", validate_digitable_line(line), &mut errors),
        None => errors.push(ValidationIssue::low("Linha digitável não encontrada")),
    }

    if let Some(barcode) = &data.barcode {
        record("codigo_barras", validate_barcode(barcode), &mut errors);
    }

    match data.amount {
        Some(amount) if amount != 0.0 => record("valor", validate_amount(amount), &mut errors),
        _ => errors.push(ValidationIssue::low("Valor não encontrado")),
    }

    match &data.due_date {
        Some(due) => record("vencimento", validate_due_date(due, today), &mut errors),
        None => errors.push(ValidationIssue::low("Vencimento não encontrado")),
    }

    if let Some(cnpj) = &data.beneficiary_cnpj {
        record("cnpj", validate_cnpj(cnpj), &mut errors);
    }

    match &data.bank_code {
        Some(code) => record("banco", validate_bank_code(code), &mut errors),
        None => errors.push(ValidationIssue::low("Código do banco não encontrado")),
    }

    if errors.is_empty() {
        log::info!("Boleto VÁLIDO según FEBRABAN");
    } else {
        log::warn!("Boleto INVÁLIDO: {} errores encontrados", errors.len());
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        details,
    }
}

fn digits_of(raw: &str) -> Vec<u8> {
    raw.bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect()
}

/// Línea digitable: 47 dígitos, con DV módulo 10 en los tres primeros campos.
pub fn validate_digitable_line(line: &str) -> FieldCheck {
    let digits = digits_of(line);
    if digits.len() != 47 {
        // Línea incompleta: problema de formato, no de DV
        return FieldCheck::from_errors(vec![ValidationIssue::medium(format!(
            "Linha digitável deve ter 47 dígitos (tem {})",
            digits.len()
        ))]);
    }

    // (campo, rango sin DV, posición del DV)
    let fields = [(1, 0..9, 9), (2, 10..20, 20), (3, 21..31, 31)];
    let errors = fields
        .into_iter()
        .filter_map(|(n, range, dv_pos)| {
            let expected = modulo10(&digits[range]);
            let found = digits[dv_pos];
            (expected != found).then(|| {
                ValidationIssue::critical(format!(
                    "DV{} inválido (esperado: {}, encontrado: {})",
                    n, expected, found
                ))
            })
        })
        .collect();

    FieldCheck::from_errors(errors)
}

/// Código de barras: 44 dígitos, DV módulo 11 en la posición 4.
pub fn validate_barcode(code: &str) -> FieldCheck {
    let digits = digits_of(code);
    if digits.len() != 44 {
        return FieldCheck::from_errors(vec![ValidationIssue::high(format!(
            "Código de barras deve ter 44 dígitos (tem {})",
            digits.len()
        ))]);
    }

    let found = digits[4];
    let without_dv: Vec<u8> = digits[..4].iter().chain(&digits[5..]).copied().collect();
    let expected = modulo11(&without_dv);

    let mut errors = Vec::new();
    if expected != found {
        errors.push(ValidationIssue::critical(format!(
            "DV do código de barras inválido (esperado: {}, encontrado: {})",
            expected, found
        )));
    }
    FieldCheck::from_errors(errors)
}

pub fn validate_amount(amount: f64) -> FieldCheck {
    let mut errors = Vec::new();
    if amount <= 0.0 {
        errors.push(ValidationIssue::low("Valor deve ser maior que zero"));
    }
    if amount > MAX_AMOUNT {
        errors.push(ValidationIssue::low(
            "Valor excede limite máximo (R$ 9.999.999,99)",
        ));
    }
    FieldCheck::from_errors(errors)
}

/// El vencimiento no puede tener más de 5 años ni estar a más de 2 años.
pub fn validate_due_date(due: &str, today: NaiveDate) -> FieldCheck {
    let date = match NaiveDate::parse_from_str(due, "%d/%m/%Y") {
        Ok(date) => date,
        Err(e) => {
            return FieldCheck::from_errors(vec![ValidationIssue::critical(format!(
                "Data de vencimento inválida: {}",
                e
            ))])
        }
    };

    let mut errors = Vec::new();
    if (today - date).num_days() > MAX_PAST_DAYS {
        errors.push(ValidationIssue::low(format!(
            "Boleto com vencimento muito antigo ({})",
            due
        )));
    }
    if (date - today).num_days() > MAX_FUTURE_DAYS {
        errors.push(ValidationIssue::low(format!(
            "Boleto com vencimento muito distante ({})",
            due
        )));
    }
    FieldCheck::from_errors(errors)
}

pub fn validate_cnpj(cnpj: &str) -> FieldCheck {
    let digits = digits_of(cnpj);
    if digits.len() != 14 {
        return FieldCheck::from_errors(vec![ValidationIssue::low("CNPJ deve ter 14 dígitos")]);
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return FieldCheck::from_errors(vec![ValidationIssue::critical(
            "CNPJ inválido (sequência repetida)",
        )]);
    }

    let mut errors = Vec::new();
    if cnpj_check_digit(&digits[..12], &[5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]) != digits[12] {
        errors.push(ValidationIssue::critical(
            "Primeiro dígito verificador do CNPJ inválido",
        ));
    }
    if cnpj_check_digit(&digits[..13], &[6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]) != digits[13] {
        errors.push(ValidationIssue::critical(
            "Segundo dígito verificador do CNPJ inválido",
        ));
    }
    FieldCheck::from_errors(errors)
}

fn cnpj_check_digit(digits: &[u8], weights: &[u32]) -> u8 {
    let sum: u32 = digits
        .iter()
        .zip(weights)
        .map(|(d, w)| u32::from(*d) * w)
        .sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => (11 - r) as u8,
    }
}

pub fn validate_bank_code(code: &str) -> FieldCheck {
    let mut errors = Vec::new();
    if !KNOWN_BANK_CODES.contains(&code) {
        errors.push(ValidationIssue::low(format!(
            "Código de banco desconhecido: {}",
            code
        )));
    }
    FieldCheck::from_errors(errors)
}

/// DV módulo 10 (campos de la línea digitable). Pesos 2,1,2,1... de
/// derecha a izquierda; los productos mayores que 9 suman sus dígitos.
pub fn modulo10(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .rev()
        .zip([2u32, 1].into_iter().cycle())
        .map(|(d, w)| {
            let product = u32::from(*d) * w;
            if product > 9 {
                product / 10 + product % 10
            } else {
                product
            }
        })
        .sum();
    match sum % 10 {
        0 => 0,
        r => (10 - r) as u8,
    }
}

/// DV módulo 11 (código de barras). Pesos 2..=9 de derecha a izquierda;
/// los resultados 0, 10 y 11 se convierten en 1.
pub fn modulo11(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .rev()
        .zip((2u32..=9).cycle())
        .map(|(d, w)| u32::from(*d) * w)
        .sum();
    match 11 - sum % 11 {
        0 | 10 | 11 => 1,
        dv => dv as u8,
    }
}
