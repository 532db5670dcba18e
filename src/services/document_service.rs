// src/services/document_service.rs

use genpdf::{elements, style, Alignment, Element};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    common::error::AppError,
    models::{
        inventory::{InventoryReport, LocationTotals, StockLocation},
        promissory::PromissoryListing,
    },
};

const FONT_NAME: &str = "Roboto";

#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: String,
    store_name: String,
}

/// Valor em reais no formato brasileiro: "R$ 1.234,56".
pub fn format_brl(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let raw = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = raw.split_once('.').unwrap_or((raw.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}R$ {},{}", if negative { "-" } else { "" }, grouped, frac_part)
}

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("Falha ao gerar PDF: {}", e))
}

impl DocumentService {
    pub fn new(fonts_dir: String, store_name: String) -> Self {
        Self { fonts_dir, store_name }
    }

    fn new_document(&self, title: &str) -> Result<genpdf::Document, AppError> {
        // Carrega a fonte da pasta configurada
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FONT_NAME, None).map_err(|_| {
            AppError::FontNotFound(format!("{}-*.ttf em {}", FONT_NAME, self.fonts_dir))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(title);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        doc.push(
            elements::Paragraph::new(self.store_name.clone())
                .styled(style::Style::new().bold().with_font_size(18)),
        );
        doc.push(
            elements::Paragraph::new(title.to_string())
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        Ok(doc)
    }

    fn render(doc: genpdf::Document) -> Result<Vec<u8>, AppError> {
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }

    // --- INVENTÁRIO ---
    pub fn inventory_pdf(&self, report: &InventoryReport) -> Result<Vec<u8>, AppError> {
        let mut doc = self.new_document("Relatório de Inventário")?;

        let scope = report.location.map(|l| l.label()).unwrap_or("TODOS");
        doc.push(elements::Paragraph::new(format!(
            "Data base: {} | Local: {}",
            report.as_of.format("%d/%m/%Y"),
            scope
        )));
        doc.push(elements::Break::new(1.5));

        // Pesos: Código (2), Produto (4), Fornecedor (3), Local (2), Qtde (1), Valor (2)
        let mut table = elements::TableLayout::new(vec![2, 4, 3, 2, 1, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Código").styled(bold))
            .element(elements::Paragraph::new("Produto").styled(bold))
            .element(elements::Paragraph::new("Fornecedor").styled(bold))
            .element(elements::Paragraph::new("Local").styled(bold))
            .element(elements::Paragraph::new("Qtde").styled(bold))
            .element(elements::Paragraph::new("Valor").styled(bold))
            .push()
            .map_err(pdf_error)?;

        for line in &report.lines {
            table
                .row()
                .element(elements::Paragraph::new(line.product_code.clone()))
                .element(elements::Paragraph::new(line.product_name.clone()))
                .element(elements::Paragraph::new(line.supplier.clone()))
                .element(elements::Paragraph::new(line.location.label()))
                .element(elements::Paragraph::new(line.quantity.to_string()))
                .element(elements::Paragraph::new(format_brl(
                    line.unit_price * Decimal::from(line.quantity),
                )))
                .push()
                .map_err(pdf_error)?;
        }

        doc.push(table);
        doc.push(elements::Break::new(2));

        let totals: [(StockLocation, &LocationTotals); 2] = [
            (StockLocation::Loja, &report.store_totals),
            (StockLocation::Deposito, &report.warehouse_totals),
        ];
        for (location, t) in totals {
            let mut p = elements::Paragraph::new(format!(
                "TOTAL {}: {} un. | {}",
                location.label(),
                t.quantity,
                format_brl(t.value)
            ));
            p.set_alignment(Alignment::Right);
            doc.push(p.styled(style::Style::new().bold().with_font_size(11)));
        }

        Self::render(doc)
    }

    // --- PROMISSÓRIAS ---
    pub fn promissory_pdf(&self, listing: &PromissoryListing, only_overdue: bool) -> Result<Vec<u8>, AppError> {
        let title = if only_overdue {
            "Promissórias em Atraso"
        } else {
            "Promissórias em Aberto"
        };
        let mut doc = self.new_document(title)?;
        doc.push(elements::Paragraph::new(format!(
            "Emitido em {}",
            listing.today.format("%d/%m/%Y")
        )));
        doc.push(elements::Break::new(1.5));

        // Pesos: Nr Venda (2), Cliente (3), E-mail (4), Saldo (2), Início (2), Parc. (1), Atraso (1), Status (2)
        let mut table = elements::TableLayout::new(vec![2, 3, 4, 2, 2, 1, 1, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Nr Venda").styled(bold))
            .element(elements::Paragraph::new("Cliente").styled(bold))
            .element(elements::Paragraph::new("E-mail").styled(bold))
            .element(elements::Paragraph::new("Saldo").styled(bold))
            .element(elements::Paragraph::new("Início").styled(bold))
            .element(elements::Paragraph::new("Parc.").styled(bold))
            .element(elements::Paragraph::new("Atraso").styled(bold))
            .element(elements::Paragraph::new("Status").styled(bold))
            .push()
            .map_err(pdf_error)?;

        for view in &listing.notes {
            let note = &view.note;
            table
                .row()
                .element(elements::Paragraph::new(note.sale_number.clone()))
                .element(elements::Paragraph::new(note.customer.clone()))
                .element(elements::Paragraph::new(note.email.clone().unwrap_or_default()))
                .element(elements::Paragraph::new(format_brl(note.balance)))
                .element(elements::Paragraph::new(note.start_date.format("%d/%m/%Y").to_string()))
                .element(elements::Paragraph::new(note.installments.to_string()))
                .element(elements::Paragraph::new(view.overdue_installments.to_string()))
                .element(elements::Paragraph::new(view.computed_status.as_str()))
                .push()
                .map_err(pdf_error)?;
        }

        doc.push(table);
        doc.push(elements::Break::new(2));

        let total: Decimal = listing.notes.iter().map(|v| v.note.balance).sum();
        let mut p = elements::Paragraph::new(format!("TOTAL A RECEBER: {}", format_brl(total)));
        p.set_alignment(Alignment::Right);
        doc.push(p.styled(style::Style::new().bold().with_font_size(12)));

        Self::render(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn formats_money_the_brazilian_way() {
        assert_eq!(format_brl("0".parse().unwrap()), "R$ 0,00");
        assert_eq!(format_brl("79.9".parse().unwrap()), "R$ 79,90");
        assert_eq!(format_brl("1234.5".parse().unwrap()), "R$ 1.234,50");
        assert_eq!(format_brl("1234567.891".parse().unwrap()), "R$ 1.234.567,89");
        assert_eq!(format_brl("-15.00".parse().unwrap()), "-R$ 15,00");
    }

    #[test]
    fn missing_fonts_are_a_typed_error() {
        let service = DocumentService::new("/caminho/que/nao/existe".into(), "Loja".into());
        let report = InventoryReport {
            as_of: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            location: None,
            lines: Vec::new(),
            store_totals: LocationTotals::default(),
            warehouse_totals: LocationTotals::default(),
        };
        assert!(matches!(service.inventory_pdf(&report), Err(AppError::FontNotFound(_))));
    }
}
