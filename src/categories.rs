use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MetricCategory {
    Attack,
    Defence,
    Passing,
    Possession,
    Physical,
    General,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 6] = [
        MetricCategory::Attack,
        MetricCategory::Defence,
        MetricCategory::Passing,
        MetricCategory::Possession,
        MetricCategory::Physical,
        MetricCategory::General,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetricCategory::Attack => "Ataque",
            MetricCategory::Defence => "Defesa",
            MetricCategory::Passing => "Passes & Criação",
            MetricCategory::Possession => "Posse & Controle",
            MetricCategory::Physical => "Físico & Duelos",
            MetricCategory::General => "Geral",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            MetricCategory::Attack => &[
                "Gol",
                "Assistência",
                "Chance",
                "Chute",
                "Finalização",
                "Xg",
                "xA",
                "Tiro",
                "Header",
                "Poste",
                "Entradas no terço final",
            ],
            MetricCategory::Defence => &[
                "Desarme",
                "Interceptação",
                "Rebote",
                "Falha",
                "Erro",
                "Cartão",
                "Falta",
                "Defesa",
                "Disputa defensiva",
                "Disputa na defesa",
            ],
            MetricCategory::Passing => &["Passe", "Cruzamento", "Precisão"],
            MetricCategory::Possession => {
                &["Drible", "Controle", "Bola", "Posse", "Impedimento", "Perda"]
            }
            MetricCategory::Physical => &["Duelo", "Disputa", "Desafio", "Minutos"],
            MetricCategory::General => &[],
        }
    }
}

/// Identity columns that are never metrics.
const IDENTITY_COLUMNS: [&str; 8] = [
    "?",
    "Jogador",
    "Time",
    "Posição",
    "Idade",
    "Altura",
    "Peso",
    "Nacionalidade",
];

const INDEX_COLUMN: &str = "Index";

/// Category of a single column. First matching category wins, in `MetricCategory::ALL` order.
pub fn category_of(column: &str) -> MetricCategory {
    MetricCategory::ALL
        .into_iter()
        .find(|cat| cat.keywords().iter().any(|k| column.contains(k)))
        .unwrap_or(MetricCategory::General)
}

/// Bucket dataset columns by category, preserving column order within each bucket.
///
/// Every category is present in the output, possibly empty. `Index` leads `General`.
pub fn categorize<S: AsRef<str>>(columns: &[S]) -> Vec<(MetricCategory, Vec<String>)> {
    let mut buckets: Vec<(MetricCategory, Vec<String>)> =
        MetricCategory::ALL.into_iter().map(|c| (c, Vec::new())).collect();
    let mut has_index = false;

    for column in columns.iter().map(AsRef::as_ref) {
        if IDENTITY_COLUMNS.contains(&column) {
            continue;
        }
        if column == INDEX_COLUMN {
            has_index = true;
            continue;
        }
        let cat = category_of(column);
        if let Some((_, list)) = buckets.iter_mut().find(|(c, _)| *c == cat) {
            list.push(column.to_string());
        }
    }

    if has_index && let Some((_, general)) = buckets.last_mut() {
        general.insert(0, INDEX_COLUMN.to_string());
    }
    buckets
}
