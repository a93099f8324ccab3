use serde::Serialize;

use crate::pagination::{CursorToken, Page};

/// `{"data": ...}` success body.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<CursorToken>,
}

/// `{"data": [...], "meta": {"nextCursor": ...}}` list body.
#[derive(Debug, Serialize)]
pub struct PageBody<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> From<Page<T>> for PageBody<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            data: page.items,
            meta: PageMeta {
                next_cursor: page.next_cursor.map(|c| c.encode()),
            },
        }
    }
}
