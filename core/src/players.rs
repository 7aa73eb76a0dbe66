//! Typed accessor for the `players` collection.
//!
//! # Design
//! `Players` borrows a `Client` and owns nothing. Each operation is split
//! into a pure `build_*` method that produces an `HttpRequest` and an
//! executing method that sends it through the client's transport and decodes
//! the reply. `get` additionally has `parse_get`, because its result needs
//! the caller's id written back into the record.

use tracing::{debug, instrument};

use crate::client::{ApiResponse, Client, NO_BODY};
use crate::error::ApiResult;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::path::ResourcePath;
use crate::transport::Transport;
use crate::types::{
    Player, PlayerCreateResponse, PlayerCsvExportOptions, PlayerCsvExportResponse,
    PlayerListOptions, PlayerListResponse, PlayerOnFocusOptions, PlayerOnPurchaseOptions,
    PlayerOnSessionOptions, PlayerRequest, SuccessResponse,
};

const COLLECTION: &str = "players";

#[derive(Debug)]
pub struct Players<'a, T> {
    client: &'a Client<T>,
}

impl<T> Clone for Players<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Players<'_, T> {}

fn player_path(player_id: &str) -> ApiResult<ResourcePath> {
    ResourcePath::collection(COLLECTION).segment(player_id)
}

fn player_action_path(player_id: &str, action: &str) -> ApiResult<ResourcePath> {
    player_path(player_id)?.segment(action)
}

impl<'a, T> Players<'a, T> {
    pub fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// `GET /players/{player_id}`
    pub fn build_get(&self, player_id: &str) -> ApiResult<HttpRequest> {
        self.client
            .new_request(HttpMethod::Get, &player_path(player_id)?, NO_BODY)
    }

    /// Decode a `get` response. The provider may leave `id` out of the body,
    /// so the requested `player_id` always wins.
    pub fn parse_get(
        &self,
        player_id: &str,
        response: HttpResponse,
    ) -> ApiResult<ApiResponse<Player>> {
        let decoded = self.client.decode::<Player>(response)?;
        Ok(decoded.map(|mut player| {
            player.id = player_id.to_string();
            player
        }))
    }

    /// `PUT /players/{player_id}`
    pub fn build_update(&self, player_id: &str, payload: &PlayerRequest) -> ApiResult<HttpRequest> {
        self.client
            .new_request(HttpMethod::Put, &player_path(player_id)?, Some(payload))
    }

    /// `GET /players?app_id=..&limit=..&offset=..`
    pub fn build_list(&self, options: &PlayerListOptions) -> ApiResult<HttpRequest> {
        let mut path = ResourcePath::collection(COLLECTION).query("app_id", &options.app_id);
        if let Some(limit) = options.limit {
            path = path.query("limit", limit);
        }
        if let Some(offset) = options.offset {
            path = path.query("offset", offset);
        }
        self.client.new_request(HttpMethod::Get, &path, NO_BODY)
    }

    /// `POST /players`
    pub fn build_create(&self, payload: &PlayerRequest) -> ApiResult<HttpRequest> {
        let path = ResourcePath::collection(COLLECTION);
        self.client.new_request(HttpMethod::Post, &path, Some(payload))
    }

    /// `POST /players/{player_id}/on_session`
    pub fn build_on_session(
        &self,
        player_id: &str,
        options: &PlayerOnSessionOptions,
    ) -> ApiResult<HttpRequest> {
        let path = player_action_path(player_id, "on_session")?;
        self.client.new_request(HttpMethod::Post, &path, Some(options))
    }

    /// `POST /players/{player_id}/on_purchase`
    pub fn build_on_purchase(
        &self,
        player_id: &str,
        options: &PlayerOnPurchaseOptions,
    ) -> ApiResult<HttpRequest> {
        let path = player_action_path(player_id, "on_purchase")?;
        self.client.new_request(HttpMethod::Post, &path, Some(options))
    }

    /// `POST /players/{player_id}/on_focus`
    pub fn build_on_focus(
        &self,
        player_id: &str,
        options: &PlayerOnFocusOptions,
    ) -> ApiResult<HttpRequest> {
        let path = player_action_path(player_id, "on_focus")?;
        self.client.new_request(HttpMethod::Post, &path, Some(options))
    }

    /// `POST /players/csv_export?app_id=..`
    pub fn build_csv_export(&self, options: &PlayerCsvExportOptions) -> ApiResult<HttpRequest> {
        let path = ResourcePath::collection(COLLECTION)
            .segment("csv_export")?
            .query("app_id", &options.app_id);
        self.client.new_request(HttpMethod::Post, &path, Some(options))
    }
}

impl<T: Transport> Players<'_, T> {
    /// Fetch one player.
    ///
    /// # Errors
    /// - `ApiError::InvalidPath` if `player_id` is not a usable path segment
    /// - `ApiError::Transport`, `ApiError::Status`, `ApiError::Deserialization`
    ///   as reported by the client
    #[instrument(skip(self))]
    pub fn get(&self, player_id: &str) -> ApiResult<ApiResponse<Player>> {
        let request = self.build_get(player_id)?;
        let response = self.client.execute(&request)?;
        let player = self.parse_get(player_id, response)?;
        debug!(session_count = player.data.session_count, "fetched player");
        Ok(player)
    }

    /// Update an existing player. Unset fields of `payload` are not sent.
    ///
    /// Repeating the call is not guaranteed to be free of side effects;
    /// the provider decides.
    #[instrument(skip(self, payload))]
    pub fn update(
        &self,
        player_id: &str,
        payload: &PlayerRequest,
    ) -> ApiResult<ApiResponse<SuccessResponse>> {
        let request = self.build_update(player_id, payload)?;
        self.client.send(&request)
    }

    /// Fetch one page of the app's players. Requires a REST API key.
    #[instrument(skip(self, options), fields(app_id = %options.app_id))]
    pub fn list(&self, options: &PlayerListOptions) -> ApiResult<ApiResponse<PlayerListResponse>> {
        let request = self.build_list(options)?;
        let page = self.client.send::<PlayerListResponse>(&request)?;
        debug!(
            total_count = page.data.total_count,
            returned = page.data.players.len(),
            "listed players"
        );
        Ok(page)
    }

    /// Register a new player.
    #[instrument(skip(self, payload), fields(app_id = %payload.app_id))]
    pub fn create(&self, payload: &PlayerRequest) -> ApiResult<ApiResponse<PlayerCreateResponse>> {
        let request = self.build_create(payload)?;
        self.client.send(&request)
    }

    /// Report a new session for a player.
    #[instrument(skip(self, options))]
    pub fn on_session(
        &self,
        player_id: &str,
        options: &PlayerOnSessionOptions,
    ) -> ApiResult<ApiResponse<SuccessResponse>> {
        let request = self.build_on_session(player_id, options)?;
        self.client.send(&request)
    }

    /// Report purchases made by a player.
    #[instrument(skip(self, options), fields(purchases = options.purchases.len()))]
    pub fn on_purchase(
        &self,
        player_id: &str,
        options: &PlayerOnPurchaseOptions,
    ) -> ApiResult<ApiResponse<SuccessResponse>> {
        let request = self.build_on_purchase(player_id, options)?;
        self.client.send(&request)
    }

    /// Report time spent in the app since the last report.
    #[instrument(skip(self, options), fields(active_time = options.active_time))]
    pub fn on_focus(
        &self,
        player_id: &str,
        options: &PlayerOnFocusOptions,
    ) -> ApiResult<ApiResponse<SuccessResponse>> {
        let request = self.build_on_focus(player_id, options)?;
        self.client.send(&request)
    }

    /// Ask the provider to generate a CSV export and return its URL.
    /// Requires a REST API key.
    #[instrument(skip(self, options), fields(app_id = %options.app_id))]
    pub fn csv_export(
        &self,
        options: &PlayerCsvExportOptions,
    ) -> ApiResult<ApiResponse<PlayerCsvExportResponse>> {
        let request = self.build_csv_export(options)?;
        self.client.send(&request)
    }
}
