//! Field mapping handed to the report template.

use super::common::{bool_label, format_br_date, format_coordinate};
use super::engine::{Context, Value};
use super::images::ImageResolver;
use super::photos::{self, PhotoRow, RoomBlock};
use super::tables::{InspectionTables, MatchedRow, Row};
use super::LaudoError;

/// Width of the cover photo.
pub const COVER_WIDTH_CM: f64 = 16.0;

/// Plain text fields per sheet, as named in the template.
const VISTORIA_FIELDS: [&str; 5] = [
    "Contratante",
    "Referencia",
    "Representante",
    "Cargo",
    "ART",
];

const IMOVEL_FIELDS: [&str; 19] = [
    "Acompanhante",
    "Tipo_imovel",
    "pavimentos",
    "a_construida",
    "a_terreno",
    "denominacao",
    "Idade",
    "tipo_idade",
    "funcao",
    "uso",
    "padrao",
    "Fechamento",
    "Esquadria",
    "piso",
    "parede",
    "Forro",
    "Cobertura",
    "Singularidades",
    "intervencao",
];

const INFO_EST_FIELDS: [&str; 22] = [
    "projetista",
    "Construtora",
    "Estrutura",
    "Cobrimento",
    "rev_estrutura",
    "lajes",
    "tipo_lajes",
    "secao_pilar",
    "secao_viga",
    "junta_estado",
    "Fundacao",
    "cota_fund",
    "solo",
    "lencol_freatico",
    "lim_tipo",
    "drenagem",
    "prot_taludes",
    "topografia",
    "microclima",
    "classe_agre",
    "esp_incendio",
    "esp_agressivo",
];

/// Yes/no fields of `Info_Est`.
const INFO_EST_FLAGS: [&str; 7] = [
    "junta",
    "arvore",
    "limitrofes",
    "taludes",
    "incendio",
    "agressivo",
    "carregamento",
];

/// Text fields with a default when blank: (field, column, default).
const DEFAULTED_FIELDS: [(&str, &str, &str); 4] = [
    ("LAUDO", "Laudo", "Vistoria"),
    ("Laudo", "Laudo", "Vistoria"),
    ("Artigo_", "Artigo_", "A"),
    ("Artigo", "Artigo", "a"),
];

/// The rows of one inspection across the record sheets.
#[derive(Debug, Clone, Copy)]
pub struct InspectionRows<'a> {
    pub vistoria: &'a Row,
    pub endereco: MatchedRow<'a>,
    pub imovel: MatchedRow<'a>,
    pub info_est: MatchedRow<'a>,
}

impl<'a> InspectionRows<'a> {
    /// Resolve every sheet for `id_vistoria`. Only the `Vistoria` row is
    /// mandatory.
    pub fn resolve(tables: &'a InspectionTables, id_vistoria: &str) -> Result<Self, LaudoError> {
        Ok(Self {
            vistoria: tables.inspection(id_vistoria)?,
            endereco: tables.endereco.find_by_id(id_vistoria),
            imovel: tables.imovel.find_by_id(id_vistoria),
            info_est: tables.info_est.find_by_id(id_vistoria),
        })
    }
}

/// Photo sections with a continuous figure count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoSections {
    pub general: Vec<PhotoRow>,
    pub rooms: Vec<RoomBlock>,
}

impl PhotoSections {
    /// General photos take figures from 1; rooms continue the count.
    pub fn assemble(tables: &InspectionTables, id_vistoria: &str, images: &ImageResolver) -> Self {
        let (general, next_fig) =
            photos::assemble_general(&tables.fotos_imovel, id_vistoria, images, 1);
        let (rooms, last_fig) = photos::assemble_rooms(
            &tables.ambientes,
            &tables.foto_ambiente,
            id_vistoria,
            images,
            next_fig,
        );
        log::debug!(
            "Inspection {}: {} general photo row(s), {} room(s), {} figure(s)",
            id_vistoria,
            general.len(),
            rooms.len(),
            last_fig - 1
        );
        Self { general, rooms }
    }
}

fn insert_text(context: &mut Context, field: &str, text: String) {
    context.insert(field.to_string(), Value::Text(text));
}

/// Build the complete template context.
pub fn build_context(
    rows: &InspectionRows<'_>,
    sections: &PhotoSections,
    images: &ImageResolver,
) -> Context {
    let mut context = Context::new();
    let vistoria = MatchedRow::new(Some(rows.vistoria));

    for (field, column, default) in DEFAULTED_FIELDS {
        let text = vistoria.text(column);
        let text = if text.is_empty() {
            default.to_string()
        } else {
            text
        };
        insert_text(&mut context, field, text);
    }

    for field in VISTORIA_FIELDS {
        insert_text(&mut context, field, vistoria.text(field));
    }

    let cover = images.resolve(&vistoria.text("Foto_da_capa"));
    context.insert(
        "Foto_da_capa".to_string(),
        Value::image_or_empty(cover, COVER_WIDTH_CM),
    );

    insert_text(
        &mut context,
        "Endereco_imovel",
        rows.endereco.text("Endereco_imovel"),
    );
    insert_text(
        &mut context,
        "Coordenada_DMS",
        format_coordinate(&rows.endereco.text("Coordenada")),
    );

    insert_text(
        &mut context,
        "Data_da_vistoria",
        format_br_date(&rows.imovel.text("Data_da_vistoria")),
    );
    for field in IMOVEL_FIELDS {
        insert_text(&mut context, field, rows.imovel.text(field));
    }
    insert_text(&mut context, "plano", bool_label(rows.imovel.value("plano")));

    for field in INFO_EST_FIELDS {
        insert_text(&mut context, field, rows.info_est.text(field));
    }
    for field in INFO_EST_FLAGS {
        insert_text(&mut context, field, bool_label(rows.info_est.value(field)));
    }

    context.insert(
        "geral_rows".to_string(),
        Value::List(sections.general.iter().map(PhotoRow::general_value).collect()),
    );
    context.insert(
        "ambientes".to_string(),
        Value::List(sections.rooms.iter().map(RoomBlock::to_value).collect()),
    );

    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::laudo::tables::{CellValue, Table};

    fn tables() -> InspectionTables {
        InspectionTables {
            vistoria: Table::from_rows(
                &["ID_Vistoria", "Contratante", "Laudo", "Artigo"],
                vec![vec!["V001".into(), "ACME Ltda".into(), "".into(), "o".into()]],
            ),
            endereco: Table::from_rows(
                &["ID_Vistoria", "Endereco_imovel", "Coordenada"],
                vec![vec![
                    "V001".into(),
                    " Rua A, 10 ".into(),
                    "-23.5505, -46.6333".into(),
                ]],
            ),
            imovel: Table::from_rows(
                &["ID_Vistoria", "Data_da_vistoria", "plano", "Idade"],
                vec![vec![
                    "V001".into(),
                    "2024-03-05".into(),
                    true.into(),
                    12.0.into(),
                ]],
            ),
            info_est: Table::from_rows(
                &["ID_Vistoria", "junta", "arvore", "microclima "],
                vec![vec![
                    "V001".into(),
                    false.into(),
                    "  talvez ".into(),
                    "Úmido".into(),
                ]],
            ),
            ..Default::default()
        }
    }

    fn text<'a>(context: &'a Context, field: &str) -> &'a str {
        context
            .get(field)
            .and_then(Value::as_text)
            .unwrap_or_else(|| panic!("{field} is not text"))
    }

    fn build(tables: &InspectionTables) -> Context {
        let dir = tempfile::tempdir().unwrap();
        let images = ImageResolver::new(dir.path());
        let rows = InspectionRows::resolve(tables, "V001").unwrap();
        let sections = PhotoSections::assemble(tables, "V001", &images);
        build_context(&rows, &sections, &images)
    }

    #[test]
    fn test_defaults_and_direct_fields() {
        let context = build(&tables());
        assert_eq!(text(&context, "LAUDO"), "Vistoria");
        assert_eq!(text(&context, "Laudo"), "Vistoria");
        assert_eq!(text(&context, "Artigo_"), "A");
        assert_eq!(text(&context, "Artigo"), "o");
        assert_eq!(text(&context, "Contratante"), "ACME Ltda");
        assert_eq!(text(&context, "Endereco_imovel"), "Rua A, 10");
        assert_eq!(text(&context, "Idade"), "12");
        assert_eq!(text(&context, "microclima"), "Úmido");
    }

    #[test]
    fn test_transformed_fields() {
        let context = build(&tables());
        assert_eq!(
            text(&context, "Coordenada_DMS"),
            "23°33'01.8\"S 46°37'59.9\"W"
        );
        assert_eq!(text(&context, "Data_da_vistoria"), "05/03/2024");
        assert_eq!(text(&context, "plano"), "Sim");
        assert_eq!(text(&context, "junta"), "Não");
        assert_eq!(text(&context, "arvore"), "talvez");
    }

    #[test]
    fn test_missing_secondary_rows_are_blank() {
        let mut tables = tables();
        tables.endereco = Table::default();
        tables.info_est = Table::from_rows(&["ID_Vistoria"], vec![vec![CellValue::from("V999")]]);
        let context = build(&tables);
        assert_eq!(text(&context, "Endereco_imovel"), "");
        assert_eq!(text(&context, "Coordenada_DMS"), "");
        assert_eq!(text(&context, "carregamento"), "");
        assert_eq!(text(&context, "Foto_da_capa"), "");
        assert_eq!(context.get("geral_rows"), Some(&Value::List(Vec::new())));
        assert_eq!(context.get("ambientes"), Some(&Value::List(Vec::new())));
    }

    #[test]
    fn test_unknown_inspection_is_not_found() {
        let tables = tables();
        let err = InspectionRows::resolve(&tables, "V404").unwrap_err();
        assert!(err.is_not_found());
    }
}
