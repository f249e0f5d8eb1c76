use crate::models::Poi;
use crate::mvi::{Intent, Reducer, UiState};
use crate::poi::{self, PoiQuery};
use crate::validation::{self, FieldCheck};

use super::{AppContext, EventQueue, FieldView, FormModel, ListModel, UiEvent, clamp_selection, select_next, select_prev};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Latitude,
    Longitude,
    Radius,
}

impl SearchField {
    const ALL: [SearchField; 3] = [SearchField::Latitude, SearchField::Longitude, SearchField::Radius];

    fn label(self) -> &'static str {
        match self {
            SearchField::Latitude => "Latitude",
            SearchField::Longitude => "Longitude",
            SearchField::Radius => "Radius (m)",
        }
    }

    fn check(self, value: &str) -> FieldCheck {
        match self {
            SearchField::Latitude => validation::validate_latitude(value),
            SearchField::Longitude => validation::validate_longitude(value),
            SearchField::Radius => match value.trim().parse::<u32>() {
                Ok(r) if r > 0 => FieldCheck::ok(),
                _ => FieldCheck::fail("Radius must be a positive number of metres"),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShopResult {
    pub poi: Poi,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NearbyShopsUiState {
    pub values: [String; 3],
    pub errors: [Option<String>; 3],
    /// Nearest first
    pub results: Vec<ShopResult>,
    pub selected: usize,
    pub searched: bool,
}

impl UiState for NearbyShopsUiState {}

impl NearbyShopsUiState {
    fn value(&self, field: SearchField) -> &str {
        &self.values[field as usize]
    }

    fn all_valid(&self) -> bool {
        SearchField::ALL.iter().all(|f| f.check(self.value(*f)).valid)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NearbyShopsIntent {
    Changed(SearchField, String),
    Search,
    SelectNext,
    SelectPrev,
}

impl Intent for NearbyShopsIntent {}

pub struct NearbyShopsReducer;

impl Reducer for NearbyShopsReducer {
    type State = NearbyShopsUiState;
    type Intent = NearbyShopsIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            NearbyShopsIntent::Changed(field, value) => {
                state.errors[field as usize] = field.check(&value).message;
                state.values[field as usize] = value;
            }
            NearbyShopsIntent::SelectNext => state.selected = select_next(state.selected, state.results.len()),
            NearbyShopsIntent::SelectPrev => state.selected = select_prev(state.selected),
            NearbyShopsIntent::Search => {}
        }
        state
    }
}

pub struct NearbyShopsViewModel {
    state: NearbyShopsUiState,
    events: EventQueue,
}

impl NearbyShopsViewModel {
    pub fn new(ctx: &AppContext) -> Self {
        let mut state = NearbyShopsUiState::default();
        if let Some((lat, lon)) = ctx.shops.home() {
            state.values[SearchField::Latitude as usize] = lat.to_string();
            state.values[SearchField::Longitude as usize] = lon.to_string();
        }
        state.values[SearchField::Radius as usize] = ctx.shops.radius_m.to_string();
        Self {
            state,
            events: EventQueue::default(),
        }
    }

    pub fn state(&self) -> &NearbyShopsUiState {
        &self.state
    }

    pub fn dispatch(&mut self, ctx: &AppContext, intent: NearbyShopsIntent) {
        self.state = NearbyShopsReducer::reduce(std::mem::take(&mut self.state), intent.clone());
        if intent == NearbyShopsIntent::Search {
            self.search(ctx);
        }
    }

    fn search(&mut self, ctx: &AppContext) {
        if !self.state.all_valid() {
            for field in SearchField::ALL {
                self.state.errors[field as usize] = field.check(self.state.value(field)).message;
            }
            self.events.message("Enter a location to search around");
            return;
        }
        let Some(finder) = &ctx.shop_finder else {
            self.events.message("Shop search is not available");
            return;
        };

        let parse = |field: SearchField| self.state.value(field).trim().parse::<f64>().unwrap_or_default();
        let (lat, lon) = (parse(SearchField::Latitude), parse(SearchField::Longitude));
        let radius = self.state.value(SearchField::Radius).trim().parse::<u32>().unwrap_or(ctx.shops.radius_m);

        let found = PoiQuery::new(&ctx.shops.tag, radius, lat, lon).and_then(|query| finder.find(&query));
        match found {
            Ok(mut pois) => {
                poi::sort_by_distance(&mut pois, lat, lon);
                self.state.results = pois
                    .into_iter()
                    .map(|p| ShopResult {
                        distance_km: poi::distance_km(lat, lon, p.lat, p.lon),
                        poi: p,
                    })
                    .collect();
                self.state.selected = clamp_selection(self.state.selected, self.state.results.len());
                self.state.searched = true;
                self.events
                    .message(format!("Found {} shop(s) within {} m", self.state.results.len(), radius));
            }
            Err(e) => {
                tracing::warn!(error = %e, "shop search failed");
                self.events.message(e.to_string());
            }
        }
    }
}

impl FormModel for NearbyShopsViewModel {
    fn fields(&self) -> Vec<FieldView> {
        SearchField::ALL
            .iter()
            .map(|f| FieldView::text(f.label(), self.state.value(*f), &self.state.errors[*f as usize]))
            .collect()
    }

    fn set_field(&mut self, index: usize, value: String) {
        if let Some(field) = SearchField::ALL.get(index) {
            self.state =
                NearbyShopsReducer::reduce(std::mem::take(&mut self.state), NearbyShopsIntent::Changed(*field, value));
        }
    }

    fn can_submit(&self) -> bool {
        self.state.all_valid()
    }

    fn submit(&mut self, ctx: &AppContext) {
        self.dispatch(ctx, NearbyShopsIntent::Search);
    }

    fn drain_events(&mut self) -> Vec<UiEvent> {
        self.events.drain()
    }
}

impl ListModel for NearbyShopsViewModel {
    fn rows(&self) -> Vec<String> {
        self.state
            .results
            .iter()
            .map(|r| {
                let address = r.poi.address().map(|a| format!("  {}", a)).unwrap_or_default();
                format!("{:>6.2} km  {}{}", r.distance_km, r.poi.name, address)
            })
            .collect()
    }

    fn selected(&self) -> usize {
        self.state.selected
    }

    fn empty_text(&self) -> &'static str {
        if self.state.searched {
            "No shops found nearby."
        } else {
            "Enter a location and search."
        }
    }
}
