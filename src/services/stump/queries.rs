//! GraphQL documents sent to the Stump server

const LIBRARY_FIELDS: &str = "
    id
    name
    description
    path
    status
    createdAt
    updatedAt
    tags { id name }
    config {
        convertRarToZip
        hardDeleteConversions
        generateFileHashes
        processMetadata
        thumbnailConfig { format quality }
    }";

const SERIES_METADATA_FIELDS: &str = "
    seriesId
    ageRating
    booktype
    comicid
    imprint
    metaType
    publisher
    status
    summary
    title
    volume
    year
    characters
    genres
    links
    writers";

const MEDIA_METADATA_FIELDS: &str = "
    mediaId
    ageRating
    day
    language
    month
    notes
    number
    pageCount
    publisher
    series
    summary
    title
    titleSort
    volume
    year
    identifierIsbn
    writers
    genres
    characters
    colorists
    coverArtists
    editors
    inkers
    letterers
    links
    pencillers
    teams";

const PAGE_INFO_FIELDS: &str = "
    pageInfo {
        ... on OffsetPaginationInfo {
            totalPages
            totalItems
            currentPage
            pageSize
            pageOffset
            zeroBased
        }
    }";

fn series_fields() -> String {
    format!(
        "id name description path status createdAt updatedAt libraryId mediaCount
        tags {{ id name }}
        metadata {{ {SERIES_METADATA_FIELDS} }}"
    )
}

fn media_fields(with_series_metadata: bool) -> String {
    let series = if with_series_metadata {
        format!("series {{ id name resolvedName metadata {{ {SERIES_METADATA_FIELDS} }} }}")
    } else {
        "series { id name resolvedName }".to_string()
    };
    format!(
        "id name path size extension pages status createdAt updatedAt seriesId libraryId hash seriesPosition
        {series}
        metadata {{ {MEDIA_METADATA_FIELDS} }}"
    )
}

pub fn get_libraries() -> String {
    format!(
        "query GetLibraries($pagination: Pagination!) {{
            libraries(pagination: $pagination) {{ nodes {{ {LIBRARY_FIELDS} }} }}
        }}"
    )
}

pub fn get_library() -> String {
    format!("query GetLibrary($id: ID!) {{ libraryById(id: $id) {{ {LIBRARY_FIELDS} }} }}")
}

pub const SCAN_LIBRARY: &str = "mutation ScanLibrary($id: ID!) { scanLibrary(id: $id) }";

pub fn get_series_page() -> String {
    format!(
        "query GetSeries($filter: SeriesFilterInput!, $pagination: Pagination!) {{
            series(filter: $filter, pagination: $pagination) {{
                nodes {{ {} }}
                {PAGE_INFO_FIELDS}
            }}
        }}",
        series_fields()
    )
}

pub fn get_all_series() -> String {
    format!(
        "query GetAllSeries($filter: SeriesFilterInput!, $pagination: Pagination!) {{
            series(filter: $filter, pagination: $pagination) {{ nodes {{ {} }} }}
        }}",
        series_fields()
    )
}

pub fn get_series_detail() -> String {
    format!(
        "query GetSeriesDetail($id: ID!) {{ seriesById(id: $id) {{ {} }} }}",
        series_fields()
    )
}

pub const UPDATE_SERIES_METADATA: &str = "mutation UpdateSeriesMetadata($id: ID!, $input: SeriesMetadataInput!) {
    updateSeriesMetadata(id: $id, input: $input) { id }
}";

pub const SCAN_SERIES: &str = "mutation ScanSeries($id: ID!) { scanSeries(id: $id) }";

pub fn get_media_page() -> String {
    format!(
        "query GetMedia($filter: MediaFilterInput!, $pagination: Pagination!) {{
            media(filter: $filter, pagination: $pagination) {{
                nodes {{ {} }}
                {PAGE_INFO_FIELDS}
            }}
        }}",
        media_fields(false)
    )
}

pub fn get_all_media() -> String {
    format!(
        "query GetAllMedia($filter: MediaFilterInput!, $pagination: Pagination!) {{
            media(filter: $filter, pagination: $pagination) {{ nodes {{ {} }} }}
        }}",
        media_fields(false)
    )
}

pub fn get_media_detail() -> String {
    format!(
        "query GetMediaDetail($id: ID!) {{ mediaById(id: $id) {{ {} }} }}",
        media_fields(false)
    )
}

pub fn get_media_with_series() -> String {
    format!(
        "query GetMediaWithSeries($id: ID!) {{ mediaById(id: $id) {{ {} }} }}",
        media_fields(true)
    )
}

pub const UPDATE_MEDIA_METADATA: &str = "mutation UpdateMediaMetadata($id: ID!, $input: MediaMetadataInput!) {
    updateMediaMetadata(id: $id, input: $input) { id }
}";

pub const UPLOAD_SERIES_COVER: &str = "mutation UploadSeriesCover($id: ID!, $image: String!) {
    uploadSeriesThumbnailBase64(id: $id, image: $image) { id }
}";

pub const UPLOAD_MEDIA_COVER: &str = "mutation UploadMediaCover($id: ID!, $image: String!) {
    uploadMediaThumbnailBase64(id: $id, image: $image) { id }
}";

/// Subscription started on the websocket once the connection is acknowledged
pub const READ_EVENTS_SUBSCRIPTION: &str = "subscription ReadEvents {
    readEvents {
        __typename
        ... on CreatedMedia { id seriesId libraryId }
    }
}";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paged_queries_select_page_info() {
        assert!(get_series_page().contains("OffsetPaginationInfo"));
        assert!(get_media_page().contains("zeroBased"));
        assert!(!get_all_media().contains("pageInfo"));
    }

    #[test]
    fn test_media_with_series_selects_series_metadata() {
        let query = get_media_with_series();
        assert!(query.contains("resolvedName metadata"));
        assert!(!get_media_detail().contains("resolvedName metadata"));
    }
}
