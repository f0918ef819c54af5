//! Fixture workbooks shaped like the ARCA "Mis Retenciones" export.

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

/// Header row of the source export, in source order.
pub(crate) const SOURCE_HEADERS: [&str; 14] = [
    "CUIT Agente Ret./Perc.",
    "Denominación o Razón Social",
    "Impuesto",
    "Descripción Impuesto",
    "Régimen",
    "Descripción Régimen",
    "Fecha Ret./Perc.",
    "Número Certificado",
    "Descripción Operación",
    "Importe Ret./Perc.",
    "Número Comprobante",
    "Fecha Comprobante",
    "Descripción Comprobante",
    "Fecha Registración DJ Ag.Ret.",
];

#[derive(Debug, Clone)]
pub(crate) enum Cell {
    Text(&'static str),
    Number(f64),
    Date(u16, u8, u8),
    Empty,
}

#[derive(Debug, Clone)]
pub(crate) struct SourceRow {
    pub cuit: Cell,
    pub name: Cell,
    pub date: Cell,
    pub voucher: Cell,
    pub description: Cell,
    pub amount: Cell,
}

impl SourceRow {
    pub fn new(date: Cell, amount: Cell) -> Self {
        Self {
            cuit: Cell::Text("30500010912"),
            name: Cell::Text("AGENTE DE PERCEPCION SA"),
            date,
            voucher: Cell::Text("0001-00000001"),
            description: Cell::Text("Factura A"),
            amount,
        }
    }
}

/// Three rows out of date order: 15/03, 01/03, 28/02 (2024).
pub(crate) fn sample_rows() -> Vec<SourceRow> {
    vec![
        SourceRow {
            cuit: Cell::Text("00123456"),
            name: Cell::Text("DISTRIBUIDORA NORTE SRL"),
            date: Cell::Text("15/03/2024"),
            voucher: Cell::Text("00123456"),
            description: Cell::Text("Factura A"),
            amount: Cell::Number(100.00),
        },
        SourceRow {
            cuit: Cell::Number(30500010912.0),
            name: Cell::Text("SUPERMERCADOS DEL SUR SA"),
            date: Cell::Date(2024, 3, 1),
            voucher: Cell::Number(4512.0),
            description: Cell::Text("Factura B"),
            amount: Cell::Number(250.50),
        },
        SourceRow {
            cuit: Cell::Text("30712345678"),
            name: Cell::Text("COMBUSTIBLES OESTE SA"),
            date: Cell::Text("28/02/2024"),
            voucher: Cell::Text("0003-00000789"),
            description: Cell::Text("Nota de Débito A"),
            amount: Cell::Text("75.25"),
        },
    ]
}

/// Build an `.xlsx` export with the full ARCA header set.
pub(crate) fn source_workbook(rows: &[SourceRow]) -> Vec<u8> {
    source_workbook_with_headers(&SOURCE_HEADERS, rows)
}

/// Build an `.xlsx` export with a custom header row. Only headers present in
/// [`SOURCE_HEADERS`] receive data.
pub(crate) fn source_workbook_with_headers(headers: &[&str], rows: &[SourceRow]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    let sheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, header) in headers.iter().enumerate() {
            let cell = match *header {
                "CUIT Agente Ret./Perc." => row.cuit.clone(),
                "Denominación o Razón Social" => row.name.clone(),
                "Fecha Ret./Perc." => row.date.clone(),
                "Número Comprobante" => row.voucher.clone(),
                "Descripción Comprobante" => row.description.clone(),
                "Importe Ret./Perc." => row.amount.clone(),
                "Impuesto" => Cell::Number(767.0),
                "Descripción Impuesto" => Cell::Text("SICORE - Impuesto al Valor Agregado"),
                "Régimen" => Cell::Number(493.0),
                "Descripción Régimen" => Cell::Text("Percepción IVA"),
                "Número Certificado" => Cell::Text("000000001"),
                "Descripción Operación" => Cell::Text("Percepción"),
                "Fecha Comprobante" => Cell::Text("01/01/2024"),
                "Fecha Registración DJ Ag.Ret." => Cell::Text("10/04/2024"),
                _ => Cell::Empty,
            };
            let col = col as u16;
            match cell {
                Cell::Text(text) => {
                    sheet.write_string(r, col, text).unwrap();
                }
                Cell::Number(value) => {
                    sheet.write_number(r, col, value).unwrap();
                }
                Cell::Date(y, m, d) => {
                    let date = ExcelDateTime::from_ymd(y, m, d).unwrap();
                    sheet.write_datetime_with_format(r, col, &date, &date_format).unwrap();
                }
                Cell::Empty => {}
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}
