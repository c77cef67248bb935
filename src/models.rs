// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use diesel::prelude::*;

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::signals::signals)]
pub struct SignalRow {
    pub name: String,
    pub point: postgis_diesel::types::Point,
    pub accuracy: f64,
    pub extra: String,
    //"main", "block" or not yet known
    pub signal_type: Option<String>,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::signals::signal_next)]
pub struct SignalNextRow {
    pub signal: String,
    pub next_signal: String,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::signals::signal_prev)]
pub struct SignalPrevRow {
    pub signal: String,
    pub prev_signal: String,
}
