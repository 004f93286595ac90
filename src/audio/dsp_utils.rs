// Utilitaires DSP - Hygiène audio
//
// Ce module contient les fonctions essentielles pour maintenir
// une qualité audio optimale dans le callback temps-réel.

/// Flush denormals to zero (anti-dénormaux)
///
/// Les nombres dénormaux (très proches de 0) peuvent causer des ralentissements CPU
/// importants sur certains processeurs. Cette fonction force les très petites valeurs
/// à zéro pour éviter ce problème.
///
/// Seuil: 1e-15 (largement sous le bruit numérique à 32-bit float)
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Soft clipping avec tanh (saturation douce)
///
/// Limite doucement la sortie audio dans [-1, 1] sans créer de distorsion dure.
/// Six voix superposées au pic de leur enveloppe dépassent 1.0 sans ce garde-fou.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}
