/// Sujetos sobre los que opera una consulta agregada.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(Vec<String>),
}

impl Selection {
    pub fn only<I>(ids: I) -> Self
        where I: IntoIterator,
              I::Item: Into<String>
    {
        Selection::Only(ids.into_iter().map(Into::into).collect())
    }

    pub fn one(id: impl Into<String>) -> Self {
        Selection::Only(vec![id.into()])
    }
}
