use tripmate_types::chat::RoomId;
use tripmate_types::error::HttpError;
use tripmate_types::plan::PlanArtifact;

/// Where the tracker fetches a room's generated plan artifacts from.
///
/// Implemented by `ChatApi`; tests use an in-memory list.
pub trait PlanSource: Send + Sync + 'static {
    fn list_plans(
        &self,
        room_id: RoomId,
    ) -> impl std::future::Future<Output = Result<Vec<PlanArtifact>, HttpError>> + Send;
}
