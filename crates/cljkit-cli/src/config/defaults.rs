pub struct DefaultsConfig {
    pub coulomb_cutoff: f64,
    pub lj_cutoff: f64,
    pub scale_14_coulomb: f64,
    pub scale_14_lj: f64,
    pub grid_spacing: f64,
    pub temperature: f64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            coulomb_cutoff: 15.0,
            lj_cutoff: 15.0,
            scale_14_coulomb: 0.5,
            scale_14_lj: 0.5,
            grid_spacing: 0.5,
            temperature: 298.15,
        }
    }
}
