use eyre::{
    bail,
    Result,
};
use ratatui::{
    layout::{
        Constraint,
        Direction,
        Flex,
        Layout,
    },
    prelude::Rect,
};

const CONTROLS_WIDTH: u16 = 46;

/// Split the screen: nav header and main content
pub(crate) fn header_and_main_area(area: Rect) -> Result<[Rect; 2]> {
    let constraints = vec![
        Constraint::Max(2), // Header
        Constraint::Min(0), // Main area
    ];

    let [header_area, area] = *Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area)
    else {
        bail!("Failed to split the area");
    };

    Ok([header_area, area])
}

/// Header, controls column on the left, chart on the right
pub(crate) fn header_controls_and_chart(area: Rect) -> Result<[Rect; 3]> {
    let [header, area] = header_and_main_area(area)?;
    let [controls, chart] = *Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(CONTROLS_WIDTH), Constraint::Min(0)])
        .split(area)
    else {
        bail!("Failed to split the area");
    };
    Ok([header, controls, chart])
}

/// Centers a [`Rect`] within another [`Rect`] using the provided [`Constraint`]s.
pub(crate) fn center(area: Rect, horizontal: Constraint, vertical: Constraint) -> Rect {
    let [area] = Layout::horizontal([horizontal]).flex(Flex::Center).areas(area);
    let [area] = Layout::vertical([vertical]).flex(Flex::Center).areas(area);
    area
}
