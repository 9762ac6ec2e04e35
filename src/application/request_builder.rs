use crate::{
    api::{Endpoint, JobType, OutboundRequest, Payload},
    domain::{Mode, ValidSource, ValidatedRequest},
};

/// Turns a validated draft into the request posted to the conversion service
pub fn build(request: ValidatedRequest) -> OutboundRequest {
    let ValidatedRequest {
        mode,
        source,
        format,
        quality,
    } = request;

    let (endpoint, job_type) = match mode {
        Mode::SingleVideo => (Endpoint::Convert, Some(JobType::Single)),
        Mode::Playlist => (Endpoint::Convert, Some(JobType::Playlist)),
        Mode::BatchFile => (Endpoint::Batch, None),
    };

    let payload = match source {
        ValidSource::Url(url) => Payload::Url(url),
        ValidSource::File(file) => Payload::File {
            name: file.name,
            bytes: file.bytes,
        },
    };

    OutboundRequest {
        endpoint,
        mode,
        payload,
        format,
        quality,
        job_type,
    }
}
