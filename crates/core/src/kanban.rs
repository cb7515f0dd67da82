//! Fixed-bucket grouping for board views.
//!
//! Every status of the entity gets a column, in declaration order, even
//! when empty, so clients can render a stable board.

use serde::Serialize;

use crate::status::Transition;

/// One board column.
#[derive(Debug, Clone, Serialize)]
pub struct KanbanColumn<T> {
    pub status: &'static str,
    pub count: usize,
    pub items: Vec<T>,
}

/// Group `items` into one column per status of `S`.
///
/// `status_of` returns the stored status string for an item. Items whose
/// status does not parse are dropped and counted in the second tuple
/// element so callers can log them.
pub fn group_by_status<S, T, F>(items: Vec<T>, status_of: F) -> (Vec<KanbanColumn<T>>, usize)
where
    S: Transition,
    F: Fn(&T) -> &str,
{
    let mut columns: Vec<KanbanColumn<T>> = S::all()
        .iter()
        .map(|s| KanbanColumn {
            status: s.as_str(),
            count: 0,
            items: Vec::new(),
        })
        .collect();

    let mut unknown = 0;
    for item in items {
        let parsed = status_of(&item).parse::<S>();
        match parsed {
            Ok(status) => {
                if let Some(column) = columns.iter_mut().find(|c| c.status == status.as_str()) {
                    column.items.push(item);
                }
            }
            Err(_) => unknown += 1,
        }
    }

    for column in &mut columns {
        column.count = column.items.len();
    }

    (columns, unknown)
}
