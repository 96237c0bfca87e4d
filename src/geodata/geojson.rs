use std::{fs, io, path::Path};

pub fn write_feature_collection_to_geojson(
    feature_collection: geojson::FeatureCollection,
    output_filepath: &Path,
) -> io::Result<()> {
    if let Some(parent) = output_filepath.parent() {
        fs::create_dir_all(parent)?;
    }
    let geojson_contents: geojson::GeoJson = geojson::GeoJson::from(feature_collection);
    fs::write(output_filepath, geojson_contents.to_string())
}
