use crate::models::{DailyCarePoint, GardenSummary, GrowthResponse, Plant, WeeklyCarePoint};
use crate::plants::{date_key, status_on, today};
use chrono::{Datelike, Duration, NaiveDate};

pub fn build_growth(plants: &[Plant]) -> GrowthResponse {
    build_growth_at(today(), plants)
}

pub fn build_growth_at(today: NaiveDate, plants: &[Plant]) -> GrowthResponse {
    const WEEK_COUNT: usize = 8;

    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset as i64);
        let (watered, fertilized, harvested) = care_counts(plants, date);
        last_7_days.push(DailyCarePoint {
            date: date_key(date),
            watered,
            fertilized,
            harvested,
        });
    }

    let current_week_start = week_start(today);
    let mut weekly_totals = Vec::with_capacity(WEEK_COUNT);

    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start - Duration::weeks(offset as i64);
        let end = start + Duration::days(6);

        let mut totals = (0u32, 0u32, 0u32);
        for day_offset in 0..7 {
            let (w, f, h) = care_counts(plants, start + Duration::days(day_offset));
            totals.0 = totals.0.saturating_add(w);
            totals.1 = totals.1.saturating_add(f);
            totals.2 = totals.2.saturating_add(h);
        }

        weekly_totals.push(WeeklyCarePoint {
            week: week_label(start),
            start_date: date_key(start),
            end_date: date_key(end),
            watered: totals.0,
            fertilized: totals.1,
            harvested: totals.2,
        });
    }

    let (watered_today, fertilized_today, harvested_today) = care_counts(plants, today);

    GrowthResponse {
        summary: GardenSummary {
            date: date_key(today),
            plant_count: plants.len(),
            watered_today,
            fertilized_today,
            harvested_today,
        },
        last_7_days,
        weekly_totals,
    }
}

fn care_counts(plants: &[Plant], day: NaiveDate) -> (u32, u32, u32) {
    plants.iter().fold((0, 0, 0), |(w, f, h), plant| {
        let status = status_on(plant, day);
        (
            w + u32::from(status.watered),
            f + u32::from(status.fertilized),
            h + u32::from(status.harvested),
        )
    })
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
