use shared::{domain::DefectType, protocol::DefectTypesUpdateRequest};

use crate::{
    error::{OrchestratorError, Result},
    orchestrator::Context,
    store::{merge_created, Mutation},
    transport::ApiRequest,
    urls,
};

pub(crate) async fn update(ctx: &Context, defect_types: Vec<DefectType>) -> Result<()> {
    let project = ctx.project()?;
    let body = DefectTypesUpdateRequest {
        ids: defect_types.clone(),
    };
    ctx.send(ApiRequest::put(
        urls::project_defect_type(&project),
        serde_json::to_value(&body)?,
    ))
    .await?;
    ctx.commit(Mutation::DefectTypesUpdated(defect_types));
    Ok(())
}

pub(crate) async fn add(ctx: &Context, defect_type: DefectType) -> Result<()> {
    let project = ctx.project()?;
    let response = ctx
        .send(ApiRequest::post(
            urls::project_defect_type(&project),
            serde_json::to_value(&defect_type)?,
        ))
        .await?;
    let created = merge_created(&response, &defect_type)?;
    ctx.commit(Mutation::DefectTypeAdded(created));
    Ok(())
}

pub(crate) async fn delete(ctx: &Context, defect_type: DefectType) -> Result<()> {
    let project = ctx.project()?;
    let id = defect_type
        .id
        .ok_or_else(|| OrchestratorError::precondition("defect type has no id"))?;
    ctx.send(ApiRequest::delete(urls::project_delete_defect_type(
        &project, id,
    )))
    .await?;
    ctx.commit(Mutation::DefectTypeDeleted(defect_type));
    Ok(())
}
