use iced::widget::{button, column, container, row, scrollable, text, Column};
use iced::{Element, Length};

use crate::state::data::DATE_FORMAT;
use crate::state::Location;
use crate::Message;

const EMPTY_LIST: &str = "No trips added yet. Pick a spot on the globe or map to start!";

/// "2024-06-01 • 48.86, 2.35", or just the coordinates when undated
pub fn summary_line(location: &Location) -> String {
    let coords = format!("{:.2}, {:.2}", location.lat, location.lng);
    match location.date {
        Some(date) => format!("{} • {}", date.format(DATE_FORMAT), coords),
        None => coords,
    }
}

/// Scrollable list of stored locations with a delete button per entry
pub fn location_list(locations: &[Location]) -> Element<'_, Message> {
    if locations.is_empty() {
        return text(EMPTY_LIST).size(14).into();
    }

    let items = locations.iter().map(|location| {
        let details = column![
            text(&location.name).size(18),
            text(summary_line(location)).size(13),
            text(location.notes.as_deref().unwrap_or("No notes")).size(13),
        ]
        .spacing(2)
        .width(Length::Fill);

        container(
            row![
                details,
                button("Delete")
                    .on_press(Message::DeleteLocation(location.id))
                    .style(button::danger)
                    .padding(6),
            ]
            .spacing(10),
        )
        .padding(8)
        .style(container::rounded_box)
        .into()
    });

    scrollable(Column::with_children(items).spacing(8))
        .height(Length::Fill)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LocationDraft, ValidationRules};
    use chrono::NaiveDate;

    #[test]
    fn test_summary_line() {
        let dated = LocationDraft::new("Paris", 48.8566, 2.3522)
            .with_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .validate(&ValidationRules::default())
            .unwrap();
        assert_eq!(summary_line(&dated), "2024-06-01 • 48.86, 2.35");

        let undated = LocationDraft::new("Sydney", -33.8688, 151.2093)
            .validate(&ValidationRules::default())
            .unwrap();
        assert_eq!(summary_line(&undated), "-33.87, 151.21");
    }
}
