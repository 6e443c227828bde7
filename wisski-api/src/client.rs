//! Blocking client for a remote WissKI instance.
//!
//! The client holds the set of active pathbuilders and the path tree
//! combined from them. Changing the active set does not refetch anything on
//! its own; call [`WisskiClient::rebuild`] afterwards.

use std::path::Path;

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use wisski_datasets::{HeaderKind, TabularDataset, TabularMapper};
use wisski_model::{Entity, EntityPersister, ModelError, PathTree, PathbuilderRecord};

use crate::config::WisskiConfig;
use crate::error::{ApiError, ApiResult};

/// Id of the tree combined from all active pathbuilders.
pub const COMBINED_TREE_ID: &str = "combined";

/// How the remote treats fields of an imported pathbuilder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportMode {
    /// Keep the field and bundle assignments of the XML.
    #[default]
    #[serde(rename = "keep")]
    Keep,
    /// Connect paths without creating fields.
    #[serde(rename = "1ae353e47a8aa3fc995220848780758a")]
    ConnectNoField,
    /// Generate new fields and bundles.
    #[serde(rename = "ea6cd7a9428f121a9a042fe66de406eb")]
    GenerateNewField,
}

/// A pathbuilder exported as XML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathbuilderExport {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub adapter: String,
    pub xml: String,
}

#[derive(Serialize)]
struct ImportRequest<'a> {
    id: &'a str,
    name: &'a str,
    adapter: &'a str,
    xml: String,
    mode: ImportMode,
}

/// Client for the pathbuilder and entity endpoints.
pub struct WisskiClient {
    config: WisskiConfig,
    http: Client,
    active: Vec<String>,
    tree: PathTree,
}

impl WisskiClient {
    /// Creates a client without contacting the remote. The path tree stays
    /// empty until [`rebuild`](Self::rebuild) is called.
    pub fn new(config: WisskiConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Config(format!("header name `{name}`: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::Config(format!("header `{name}`: {e}")))?;
            headers.insert(name, value);
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            config,
            http,
            active: Vec::new(),
            tree: PathTree::new(COMBINED_TREE_ID),
        })
    }

    /// Creates a client with every remote pathbuilder active.
    pub fn connect(config: WisskiConfig) -> ApiResult<Self> {
        let mut client = Self::new(config)?;
        let ids = client.list_pathbuilder_ids()?;
        client.set_active_pathbuilders(ids);
        client.rebuild()?;
        Ok(client)
    }

    pub fn config(&self) -> &WisskiConfig {
        &self.config
    }

    /// The tree combined from the active pathbuilders at the last rebuild.
    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    pub fn active_pathbuilders(&self) -> &[String] {
        &self.active
    }

    /// Replaces the set of active pathbuilders. Takes effect on the next
    /// [`rebuild`](Self::rebuild).
    pub fn set_active_pathbuilders<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active = ids.into_iter().map(Into::into).collect();
    }

    /// Fetches every active pathbuilder and combines them, in active order,
    /// into a fresh tree.
    pub fn rebuild(&mut self) -> ApiResult<&PathTree> {
        let mut trees = Vec::with_capacity(self.active.len());
        for id in &self.active {
            let record = self.get_pathbuilder(id)?;
            let (tree, _report) = PathTree::from_record(&record);
            trees.push(tree);
        }
        self.tree = PathTree::combined(COMBINED_TREE_ID, &trees);
        info!(
            sources = trees.len(),
            paths = self.tree.len(),
            "rebuilt combined pathbuilder"
        );
        Ok(&self.tree)
    }

    // ── pathbuilders ────────────────────────────────────────────

    /// Ids of all pathbuilders on the remote.
    pub fn list_pathbuilder_ids(&self) -> ApiResult<Vec<String>> {
        let listing: Value = self.get_json("pathbuilder/list")?;
        match listing {
            Value::Array(items) => Ok(items.iter().map(id_string).collect()),
            Value::Object(map) => Ok(map.into_iter().map(|(id, _)| id).collect()),
            other => Err(ModelError::InvalidWireData(format!(
                "pathbuilder list must be an array or object, got {other}"
            ))
            .into()),
        }
    }

    pub fn get_pathbuilder(&self, id: &str) -> ApiResult<PathbuilderRecord> {
        self.get_json(&format!("pathbuilder/{id}/get"))
    }

    /// Deletes a pathbuilder on the remote. If it was active it is dropped
    /// from the active set and the tree is rebuilt.
    pub fn delete_pathbuilder(&mut self, id: &str) -> ApiResult<String> {
        let body = self.send(Method::DELETE, &format!("pathbuilder/{id}/delete"), None)?.text()?;
        if self.active.iter().any(|active| active == id) {
            self.active.retain(|active| active != id);
            self.rebuild()?;
        }
        Ok(body)
    }

    /// Uploads a pathbuilder XML file, activates it and rebuilds the tree.
    pub fn import_pathbuilder(
        &mut self,
        id: &str,
        name: &str,
        xml_path: &Path,
        adapter: &str,
        mode: ImportMode,
    ) -> ApiResult<String> {
        let request = ImportRequest {
            id,
            name,
            adapter,
            xml: std::fs::read_to_string(xml_path)?,
            mode,
        };
        let body = serde_json::to_value(&request)?;
        let text = self.send(Method::POST, "pathbuilder/import", Some(&body))?.text()?;

        if !self.active.iter().any(|active| active == id) {
            self.active.push(id.to_string());
        }
        self.rebuild()?;
        Ok(text)
    }

    pub fn export_pathbuilder(&self, id: &str) -> ApiResult<PathbuilderExport> {
        self.get_json(&format!("pathbuilder/{id}/export"))
    }

    /// Asks the remote to generate bundles and fields for every active
    /// pathbuilder.
    pub fn generate_bundles_and_fields(&self) -> ApiResult<()> {
        for id in &self.active {
            self.send(Method::GET, &format!("pathbuilder/{id}/generate"), None)?;
        }
        Ok(())
    }

    // ── entities ────────────────────────────────────────────────

    /// Fetches an entity with its sub-entities expanded.
    pub fn get_entity(&self, uri: &str) -> ApiResult<Entity> {
        let url = self.config.endpoint("entity/get");
        debug!(method = "GET", url = %url, uri = %uri, "wisski request");
        let request = self
            .http
            .get(&url)
            .query(&[("uri", uri), ("meta", "0"), ("expand", "1")]);
        let wire: Value = parse(self.execute(request)?)?;
        Ok(Entity::from_wire(&self.tree, &wire, false)?)
    }

    /// Saves one entity unless it is unchanged and `force` is false.
    /// Returns whether a request was made.
    pub fn save_entity(&self, entity: &mut Entity, force: bool) -> ApiResult<bool> {
        entity.save(self, force)
    }

    /// Saves a batch of entities in one request and reloads each from the
    /// state the remote confirmed.
    ///
    /// With `create_if_new == false` every entity must already carry a URI.
    pub fn save_entities(&self, entities: &mut [Entity], create_if_new: bool) -> ApiResult<()> {
        if !create_if_new {
            if let Some(entity) = entities.iter().find(|e| e.uri.is_none()) {
                return Err(ModelError::MissingIdentifier(format!(
                    "entity of bundle `{}` has no uri and creation is disabled",
                    entity.bundle_id
                ))
                .into());
            }
        }

        let batch = entities
            .iter()
            .map(|entity| entity.serialize(&self.tree))
            .collect::<Result<Vec<_>, _>>()?;

        let overwrite = if create_if_new { "1" } else { "0" };
        let url = self.config.endpoint("entity/create");
        debug!(method = "POST", url = %url, entities = batch.len(), "wisski request");
        let request = self
            .http
            .post(&url)
            .query(&[("overwrite", overwrite)])
            .timeout(self.config.save_timeout())
            .json(&batch);
        let confirmed: Vec<Value> = parse(self.execute(request)?)?;

        if confirmed.len() != entities.len() {
            return Err(ApiError::BatchMismatch {
                sent: entities.len(),
                received: confirmed.len(),
            });
        }
        for (entity, wire) in entities.iter_mut().zip(&confirmed) {
            entity.load(&self.tree, wire, false)?;
        }
        Ok(())
    }

    // ── CSV ─────────────────────────────────────────────────────

    /// Creates one entity of `bundle_id` per CSV row and saves them as a
    /// single batch.
    pub fn import_csv(&self, bundle_id: &str, path: &Path, header_kind: HeaderKind) -> ApiResult<Vec<Entity>> {
        let dataset =
            TabularDataset::read(path, bundle_id, &self.config.csv_delimiter, header_kind, &self.tree)?;
        let mut entities = dataset
            .flat_rows()
            .map(|values| Entity::build(&self.tree, bundle_id, values, None))
            .collect::<Result<Vec<_>, _>>()?;
        self.save_entities(&mut entities, true)?;
        Ok(entities)
    }

    /// Appends persisted entities to the per-bundle CSV files in `dir`.
    /// Returns the number of rows written.
    pub fn export_csv(&self, entities: &[Entity], dir: &Path) -> ApiResult<usize> {
        let mapper = TabularMapper::with_delimiter(&self.tree, &self.config.csv_delimiter);
        let mut written = 0;
        for entity in entities {
            written += mapper.flatten(entity, dir)?;
        }
        Ok(written)
    }

    // ── transport ───────────────────────────────────────────────

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        parse(self.send(Method::GET, path, None)?)
    }

    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> ApiResult<Response> {
        let url = self.config.endpoint(path);
        debug!(method = %method, url = %url, "wisski request");
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request)
    }

    fn execute(&self, request: RequestBuilder) -> ApiResult<Response> {
        let request = match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_ref()),
            None => request,
        };
        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl EntityPersister for WisskiClient {
    type Error = ApiError;

    fn tree(&self) -> &PathTree {
        &self.tree
    }

    fn persist(&self, entities: &mut [Entity], create_if_new: bool) -> ApiResult<()> {
        self.save_entities(entities, create_if_new)
    }
}

fn parse<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let text = response.text()?;
    Ok(serde_json::from_str(&text)?)
}

fn id_string(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
