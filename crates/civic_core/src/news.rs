use crate::schema::{NewsItem, NewsType, Selector};

/// News items of the selected type, in source order.
pub fn filter_news<'a>(news: &'a [NewsItem], kind: &Selector<NewsType>) -> Vec<&'a NewsItem> {
    news.iter().filter(|item| kind.matches(&item.kind)).collect()
}

pub fn news_for_department<'a>(news: &'a [NewsItem], department_id: &str) -> Vec<&'a NewsItem> {
    news.iter()
        .filter(|item| item.department_id.as_deref() == Some(department_id))
        .collect()
}
