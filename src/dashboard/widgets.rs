//! The dashboard's filter and chart controls.
//!
//! The form is submitted as a GET request whenever a control changes, so the
//! current selection always lives in the page URL. Multi-selects are paired
//! with a hidden marker field so an emptied selection is not mistaken for an
//! untouched one, and with the values it offered so the selection can go back
//! to every value once earlier filters change what is on offer.

use maud::{Markup, html};
use time::Date;

use crate::{
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CHECKBOX_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
    pipeline::{
        AGG, AGG_PRESENT, CATEGORY_OFFERED_PREFIX, CATEGORY_PREFIX, CATEGORY_PRESENT, COLOR,
        CategoryOptions, DATE_END, DATE_FORMAT, DATE_START, EXCLUDE_NEGATIVE, FilterSelection,
        GROUP_BY, RenderResult, X, Y,
    },
};

/// Renders the form holding every dashboard control.
///
/// # Arguments
/// * `selection` - The selection the page was requested with
/// * `result` - The pipeline output, which decides the options each control offers
pub(super) fn filter_form(selection: &FilterSelection, result: &RenderResult) -> Markup {
    let classification = &result.classification;

    html! {
        form
            id="dashboard-filters"
            action=(endpoints::DASHBOARD_VIEW)
            method="get"
            hx-get=(endpoints::DASHBOARD_VIEW)
            hx-target="#dashboard-content"
            hx-target-error="#dashboard-content"
            hx-swap="innerHTML"
            hx-trigger="change"
            hx-push-url="true"
            class="flex flex-col gap-4 bg-gray-50 dark:bg-gray-800 p-4 rounded-lg w-full"
        {
            h3 class="text-xl font-semibold" { "Filters" }

            @if let Some(bounds) = &result.date_bounds {
                (date_range_inputs(selection, bounds.min, bounds.max))
            }

            label class="flex items-center space-x-2"
            {
                input
                    type="checkbox"
                    name=(EXCLUDE_NEGATIVE)
                    value="on"
                    checked[result.exclude_negative]
                    class=(FORM_CHECKBOX_STYLE);

                span class="text-sm" { "Exclude negative amounts" }
            }

            @for options in &result.category_options {
                (category_select(options))
            }

            h3 class="text-xl font-semibold" { "Charts" }

            (single_select(X, "X axis (categorical)", &classification.categorical, result.chart.x.as_deref(), None))
            (single_select(Y, "Y axis (numeric)", &classification.numeric, result.chart.y.as_deref(), None))
            (single_select(COLOR, "Color (categorical)", &classification.categorical, result.chart.color.as_deref(), Some("None")))

            h3 class="text-xl font-semibold" { "Grouped Summary" }

            (single_select(GROUP_BY, "Group by", &classification.categorical, result.aggregation.group_by.as_deref(), None))

            div
            {
                input type="hidden" name=(AGG_PRESENT) value="1";

                label for=(AGG) class=(FORM_LABEL_STYLE) { "Aggregate" }

                select
                    id=(AGG)
                    name=(AGG)
                    multiple
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for column in &classification.numeric {
                        option
                            value=(column)
                            selected[result.aggregation.columns.contains(column)]
                        {
                            (column)
                        }
                    }
                }
            }

            noscript
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply" }
            }
        }
    }
}

/// Start and end date inputs limited to the dataset's dates.
///
/// Without a complete range in the selection, the inputs show the full span of the data.
fn date_range_inputs(selection: &FilterSelection, min: Date, max: Date) -> Markup {
    let (start, end) = match selection.date_range.as_slice() {
        [start, end] => (*start, *end),
        _ => (min, max),
    };

    let min = format_date(min);
    let max = format_date(max);

    html! {
        div class="grid grid-cols-2 gap-2"
        {
            div
            {
                label for=(DATE_START) class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    id=(DATE_START)
                    name=(DATE_START)
                    value=(format_date(start))
                    min=(min)
                    max=(max)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for=(DATE_END) class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    id=(DATE_END)
                    name=(DATE_END)
                    value=(format_date(end))
                    min=(min)
                    max=(max)
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

fn category_select(options: &CategoryOptions) -> Markup {
    let name = format!("{CATEGORY_PREFIX}{}", options.column);
    let offered = serde_json::to_string(&options.available).unwrap_or_else(|_| "[]".to_owned());

    html! {
        div
        {
            input type="hidden" name=(CATEGORY_PRESENT) value=(options.column);
            input
                type="hidden"
                name={(CATEGORY_OFFERED_PREFIX) (options.column)}
                value=(offered);

            label for=(name) class=(FORM_LABEL_STYLE) { (options.column) }

            select
                id=(name)
                name=(name)
                multiple
                class=(FORM_TEXT_INPUT_STYLE)
            {
                @for value in &options.available {
                    option
                        value=(value)
                        selected[options.selected.contains(value)]
                    {
                        @if value.is_empty() { "(missing)" } @else { (value) }
                    }
                }
            }
        }
    }
}

/// A drop-down of `columns` with `chosen` selected.
///
/// `none_label` adds a first option with an empty value for choosing no column.
fn single_select(
    name: &str,
    label: &str,
    columns: &[String],
    chosen: Option<&str>,
    none_label: Option<&str>,
) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            select
                id=(name)
                name=(name)
                disabled[columns.is_empty()]
                class=(FORM_TEXT_INPUT_STYLE)
            {
                @if let Some(none_label) = none_label {
                    option value="" selected[chosen.is_none()] { (none_label) }
                }

                @for column in columns {
                    option
                        value=(column)
                        selected[chosen == Some(column.as_str())]
                    {
                        (column)
                    }
                }
            }
        }
    }
}

fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}
