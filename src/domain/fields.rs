//! Instrument header vocabulary.
//!
//! The testing machine writes its exports in Latin-1; we decode lossily, so
//! accented characters arrive as U+FFFD and the table below carries the mangled
//! spellings verbatim. Mapping to canonical keys happens in exactly one place
//! so the rest of the pipeline only ever sees the English names.

/// Sentinel key for header names missing from the vocabulary.
///
/// Unknown names fail closed to this key instead of aborting the parse: the
/// machine firmware occasionally grows new fields and we'd rather keep the
/// rest of the file than reject it.
pub const UNKNOWN_FIELD_KEY: &str = "unknownField";

/// Map a raw (unquoted) header name to its canonical key.
///
/// Returns `None` for vocabulary we don't know; callers store those under
/// [`UNKNOWN_FIELD_KEY`].
pub fn canonical_key(raw: &str) -> Option<&'static str> {
    let key = match raw {
        "Tipo de ensayo" => "experimentType",
        "Nombre del m\u{fffd}todo" => "methodName",
        "Nombre" => "name",
        "ID operador" => "operatorID",
        "Empresa" => "enterprise",
        "Nombre lab." => "labName",
        "Fecha ensayo" => "experimentDate",
        "Temperatura" => "temperature",
        "Humedad" => "humidity",
        "Nota 1" => "noteA",
        "Nota 2" => "noteB",
        "Nota 3" => "noteC",
        "Geometr\u{fffd}a" => "geometry",
        "Probeta" => "probe",
        "Nombre probeta" => "probeName",
        "Anchura" => "width",
        "Espesor" => "thickness",
        "Longitud" => "length",
        "Di\u{fffd}metro" => "diameter",
        "Di\u{fffd}metro int" => "innerDiameter",
        "Di\u{fffd}metro ext" => "exteriorDiameter",
        "Espesor pared" => "wallThickness",
        "\u{fffd}rea" => "area",
        "Densidad lineal" => "linearDensity",
        "Peso de pat\u{fffd}n" => "railWeight",
        "Separa. rodillos de carga" => "loadRollSeparation",
        "Separa. rodillos de soporte" => "supportRollSeparation",
        "Separaci\u{fffd}n rodillos" => "rollSeparation",
        "Tipo fijaci\u{fffd}n" => "fasteningType",
        "Observaciones" => "observations",
        "Anchura final" => "finalWidth",
        "Espesor final" => "finalThickness",
        "Longitud final" => "finalLength",
        "Di\u{fffd}metro final" => "finalDiameter",
        "Di\u{fffd}metro interior final" => "finalInnerDiameter",
        "Di\u{fffd}metro exterior final" => "finalExteriorDiameter",
        "Espesor de pared final" => "finalWallThickness",
        "\u{fffd}rea final" => "finalArea",
        "Densidad lineal final" => "finalLinearDensity",
        "Tiempo sec" => "secTime",
        "Extensi\u{fffd}n mm" => "extensionMM",
        "Carga N" => "loadN",
        "Resistencia MPa" => "resistanceMPa",
        // Trailing spaces below are in the machine output.
        "N\u{fffd}mero ciclos " => "nCycles",
        "N\u{fffd}mero total de ciclos " => "totalnCycles",
        "Total de repeticiones " => "repetitionTotal",
        "Deform. [Exten.] %" => "deformationPercent",
        "Tenacidad gf/tex" => "tenacity",
        _ => return None,
    };
    Some(key)
}
