//! services/parser_service.rs
//! Extrae campos estructurados del texto OCR de un boleto.
//!
//! El parser nunca falla: lo que no reconoce queda en `None` y la
//! validación FEBRABAN se encarga de reportarlo.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::boleto_model::BoletoData;

/// Bancos conocidos por código FEBRABAN
const BANK_NAMES: &[(&str, &str)] = &[
    ("001", "Banco do Brasil"),
    ("033", "Santander"),
    ("104", "Caixa Econômica Federal"),
    ("237", "Bradesco"),
    ("341", "Itaú"),
    ("748", "Sicredi"),
    ("756", "Bancoob"),
    ("077", "Banco Inter"),
    ("260", "Nubank"),
    ("290", "PagSeguro"),
    ("403", "Cora"),
];

const AMOUNT: &str = r"([0-9]{1,3}(?:[.,][0-9]{3})*[.,][0-9]{2})";
const CNPJ: &str = r"([0-9]{2}[.\s]?[0-9]{3}[.\s]?[0-9]{3}[/\s]?[0-9]{4}[-\s]?[0-9]{2})";

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("patrón de regex inválido"))
}

fn digitable_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"([0-9]{5})[.\s]?([0-9]{5})\s?([0-9]{5})[.\s]?([0-9]{6})\s?([0-9]{5})[.\s]?([0-9]{6})\s?([0-9])\s?([0-9]{14})",
    )
}

fn barcode_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b([0-9]{44})\b")
}

fn amount_res() -> &'static [Regex; 3] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            format!(r"(?i)R\$?\s?{AMOUNT}"),
            format!(r"(?i)Valor[:\s]+R\$?\s?{AMOUNT}"),
            AMOUNT.to_string(),
        ]
        .map(|p| Regex::new(&p).expect("patrón de valor inválido"))
    })
}

fn due_date_res() -> &'static [Regex; 3] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)Vencimento[:\s]+([0-9]{2}/[0-9]{2}/[0-9]{4})",
            r"([0-9]{2}/[0-9]{2}/[0-9]{4})",
            r"([0-9]{2}/[0-9]{2}/[0-9]{2})",
        ]
        .map(|p| Regex::new(p).expect("patrón de vencimiento inválido"))
    })
}

/// Con etiqueta los separadores son opcionales; sin etiqueta se exige el
/// formato completo o 14 dígitos sueltos.
fn cnpj_res() -> &'static [Regex; 3] {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            format!(r"(?i)CNPJ[^0-9]{{0,10}}{CNPJ}\b"),
            r"\b([0-9]{2}\.[0-9]{3}\.[0-9]{3}/[0-9]{4}-[0-9]{2})\b".to_string(),
            r"\b([0-9]{14})\b".to_string(),
        ]
        .map(|p| Regex::new(&p).expect("patrón de CNPJ inválido"))
    })
}

fn beneficiary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?im)^[ \t]*(?:Benefici[aá]rio|Cedente)[ \t]*:?[ \t]*(.+)$",
    )
}

fn agency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?i)Ag[eê]ncia[^0-9\n]{0,40}([0-9]{4})(?:[ \t]?-[ \t]?([0-9xX]))?",
    )
}

/// Extrae todos los campos reconocibles de un boleto.
pub fn parse_boleto(text: &str) -> BoletoData {
    log::info!("Iniciando parsing de boleto ({} caracteres)", text.len());

    let mut data = BoletoData {
        digitable_line: extract_digitable_line(text),
        barcode: extract_barcode(text),
        amount: extract_amount(text),
        due_date: extract_due_date(text),
        beneficiary_cnpj: extract_cnpj(text),
        beneficiary_name: extract_beneficiary_name(text),
        agency: extract_agency(text),
        ..BoletoData::default()
    };

    // El banco sale de la línea digitable; si no hay, del código de barras.
    data.bank_code = data
        .digitable_line
        .as_deref()
        .or(data.barcode.as_deref())
        .map(|digits| digits[..3].to_string());
    data.bank_name = data.bank_code.as_deref().map(bank_name);

    log::info!(
        "Parsing concluido: linha={} barras={} valor={:?} vencimento={:?} banco={:?}",
        data.digitable_line.is_some(),
        data.barcode.is_some(),
        data.amount,
        data.due_date,
        data.bank_code
    );
    data
}

/// Línea digitable (47 dígitos), normalizada a
/// `AAAAA.AAAAA BBBBB.BBBBBB CCCCC.CCCCCC D EEEEEEEEEEEEEE`.
pub fn extract_digitable_line(text: &str) -> Option<String> {
    let flat = text.replace('\n', " ");
    let caps = digitable_line_re().captures(&flat)?;
    Some(format!(
        "{}.{} {}.{} {}.{} {} {}",
        &caps[1], &caps[2], &caps[3], &caps[4], &caps[5], &caps[6], &caps[7], &caps[8]
    ))
}

/// Código de barras: 44 dígitos seguidos.
pub fn extract_barcode(text: &str) -> Option<String> {
    barcode_re()
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Valor del boleto. El último separador siempre es el decimal, así
/// "1.234,56" y "1,234.56" dan lo mismo.
pub fn extract_amount(text: &str) -> Option<f64> {
    amount_res().iter().find_map(|re| {
        let caps = re.captures(text)?;
        parse_amount(&caps[1])
    })
}

fn parse_amount(raw: &str) -> Option<f64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let cents: u64 = digits.parse().ok()?;
    Some(cents as f64 / 100.0)
}

/// Fecha de vencimiento en formato dd/mm/aaaa. Gana el primer candidato
/// que sea una fecha real del calendario.
pub fn extract_due_date(text: &str) -> Option<String> {
    due_date_res().iter().find_map(|re| {
        re.captures_iter(text).find_map(|caps| {
            let raw = &caps[1];
            let format = if raw.len() == 10 { "%d/%m/%Y" } else { "%d/%m/%y" };
            NaiveDate::parse_from_str(raw, format)
                .ok()
                .map(|date| date.format("%d/%m/%Y").to_string())
        })
    })
}

/// CNPJ del beneficiario con formato XX.XXX.XXX/XXXX-XX.
pub fn extract_cnpj(text: &str) -> Option<String> {
    // El último campo de la línea digitable también tiene 14 dígitos
    let flat = text.replace('\n', " ");
    let without_line = digitable_line_re().replace_all(&flat, " ");

    cnpj_res().iter().find_map(|re| {
        let caps = re.captures(&without_line)?;
        let digits: String = caps[1].chars().filter(char::is_ascii_digit).collect();
        (digits.len() == 14).then(|| format_cnpj(&digits))
    })
}

pub fn format_cnpj(digits: &str) -> String {
    format!(
        "{}.{}.{}/{}-{}",
        &digits[0..2],
        &digits[2..5],
        &digits[5..8],
        &digits[8..12],
        &digits[12..14]
    )
}

/// Nombre del beneficiario: lo que sigue a "Beneficiário"/"Cedente" en la misma línea.
pub fn extract_beneficiary_name(text: &str) -> Option<String> {
    beneficiary_re().captures_iter(text).find_map(|caps| {
        let rest = &caps[1];
        // El CNPJ suele venir en la misma línea
        let cut = rest
            .to_ascii_uppercase()
            .find("CNPJ")
            .map_or(rest, |idx| &rest[..idx]);
        let name = cut.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ':' | '/'));
        let letters = name.chars().filter(|c| c.is_alphabetic()).count();
        (letters >= 3).then(|| name.to_string())
    })
}

/// Agencia: 4 dígitos y, opcionalmente, el dígito verificador ("1234-5").
pub fn extract_agency(text: &str) -> Option<String> {
    let caps = agency_re().captures(text)?;
    Some(match caps.get(2) {
        Some(dv) => format!("{}-{}", &caps[1], dv.as_str()),
        None => caps[1].to_string(),
    })
}

/// Nombre del banco; los códigos desconocidos quedan como "Banco <código>".
pub fn bank_name(code: &str) -> String {
    BANK_NAMES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Banco {}", code))
}
